//! Quotesync Server binary.

use quotesync_engine::{parse_import, QuoteCollection};
use quotesync_server::{config::Config, serve, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quotesync_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!("Starting Quotesync Server on {}:{}", config.host, config.port);

    let quotes = match &config.seed_file {
        Some(path) => {
            let json = tokio::fs::read_to_string(path).await?;
            let parsed = parse_import(&json)?;
            tracing::info!(
                path = %path.display(),
                quotes = parsed.quotes.len(),
                skipped = parsed.skipped,
                "Loaded seed file"
            );
            QuoteCollection::from_quotes(parsed.quotes)
        }
        None => QuoteCollection::new(),
    };

    // Start server
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    serve(listener, AppState::new(quotes)).await?;

    Ok(())
}
