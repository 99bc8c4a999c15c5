//! Quotesync Server - reference remote for the quotesync client.
//!
//! Holds one ordered quote collection in memory and serves it over HTTP.
//! The client fetches `GET /quotes` as its remote snapshot; `POST` and
//! `PUT` let scripts and tests shape what the client will see.

pub mod config;
pub mod error;
pub mod routes;

use axum::Router;
use quotesync_engine::QuoteCollection;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone, Default)]
pub struct AppState {
    pub quotes: Arc<RwLock<QuoteCollection>>,
}

impl AppState {
    pub fn new(quotes: QuoteCollection) -> Self {
        Self {
            quotes: Arc::new(RwLock::new(quotes)),
        }
    }
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Serve the application on an already bound listener until it fails.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, app(state)).await
}
