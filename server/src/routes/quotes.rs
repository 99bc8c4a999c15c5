//! Quote collection routes.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use quotesync_engine::{quote_from_value, Quote, QuoteCollection};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::AppState;

/// Body of `POST /quotes`.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpsertRequest {
    pub text: String,
    pub category: String,
}

/// Body returned by `PUT /quotes`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReplaceResponse {
    pub count: usize,
}

/// Create quote routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/quotes",
        get(list_handler).post(upsert_handler).put(replace_handler),
    )
}

/// GET /quotes - The whole collection, in order.
async fn list_handler(State(state): State<AppState>) -> Json<Vec<Quote>> {
    let quotes = state.quotes.read().await;
    Json(quotes.quotes().to_vec())
}

/// POST /quotes - Insert a quote, or overwrite the one sharing its key.
async fn upsert_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<UpsertRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Quote>)> {
    let Json(request) = body?;
    let quote = Quote::new(&request.text, &request.category)?;

    let replaced = state.quotes.write().await.upsert(quote.clone());
    let status = match replaced {
        Some(previous) => {
            tracing::debug!(
                key = %quote.key(),
                from = %previous.category,
                to = %quote.category,
                "Quote replaced"
            );
            StatusCode::OK
        }
        None => {
            tracing::debug!(key = %quote.key(), "Quote added");
            StatusCode::CREATED
        }
    };

    Ok((status, Json(quote)))
}

/// PUT /quotes - Replace the whole collection. Every entry must be valid.
async fn replace_handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<Vec<Value>>, JsonRejection>,
) -> Result<Json<ReplaceResponse>> {
    let Json(entries) = body?;
    let quotes = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            quote_from_value(entry)
                .ok_or_else(|| AppError::BadRequest(format!("entry {} is not a valid quote", index)))
        })
        .collect::<Result<Vec<_>>>()?;

    let collection = QuoteCollection::from_quotes(quotes);
    let count = collection.len();
    *state.quotes.write().await = collection;

    tracing::info!(count, "Quote collection replaced");
    Ok(Json(ReplaceResponse { count }))
}
