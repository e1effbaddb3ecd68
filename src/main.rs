use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ape_oracle::api::{self, AppState};
use ape_oracle::chat::ChatClient;
use ape_oracle::config::{Config, LogFormat};
use ape_oracle::db::Database;
use ape_oracle::events::EventBus;
use ape_oracle::metrics::Metrics;
use ape_oracle::store::{FeedStore, MemoryFeedStore, PgFeedStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration (reads .env if present)
    let config = Config::from_env()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,ape_oracle=debug".into()),
    );
    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
    info!("Initialized configuration");

    let events = EventBus::new(config.feed.event_buffer);

    // Pick the feed backend
    let store: Arc<dyn FeedStore> = match &config.database {
        Some(db_config) => {
            let db = Arc::new(Database::connect(db_config).await?);
            info!("Using PostgreSQL feed store");
            Arc::new(PgFeedStore::new(db, events))
        }
        None => {
            info!("DATABASE_URL not set, keeping the feed in memory");
            Arc::new(MemoryFeedStore::new(events))
        }
    };

    let chat = ChatClient::new(&config.openrouter)?;
    if !chat.is_configured() {
        error!("OPENROUTER_API_KEY is not set, /chat requests will fail");
    }

    let state = AppState::new(store, chat, Metrics::new()?)
        .with_ping_interval(Duration::from_secs(config.feed.ping_interval_secs));

    api::start_api_server(&config, state, shutdown_signal()).await?;

    info!("Ape Oracle shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, initiating graceful shutdown"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await
        }
    }
}
