// Copyright (c) Ape Oracle Team
// SPDX-License-Identifier: Apache-2.0

pub mod error;
pub mod handlers;
mod routes;

pub use error::{ApiError, ApiResult};
pub use routes::router;

use crate::chat::ChatClient;
use crate::config::{Config, MAX_PING_INTERVAL_SECS};
use crate::metrics::Metrics;
use crate::store::FeedStore;
use anyhow::Result;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

/// Shared handles for request handlers, owned by process bootstrap
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn FeedStore>,
    pub chat: Arc<ChatClient>,
    pub metrics: Arc<Metrics>,
    /// Keepalive interval for realtime connections
    ping_interval: Duration,
}

impl AppState {
    pub fn new(store: Arc<dyn FeedStore>, chat: ChatClient, metrics: Metrics) -> Self {
        Self {
            store,
            chat: Arc::new(chat),
            metrics: Arc::new(metrics),
            ping_interval: Duration::from_secs(30),
        }
    }

    /// Clamped to between one second and `MAX_PING_INTERVAL_SECS`.
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval =
            interval.clamp(Duration::from_secs(1), Duration::from_secs(MAX_PING_INTERVAL_SECS));
        self
    }

    pub fn ping_interval(&self) -> Duration {
        self.ping_interval
    }
}

/// Start the API server and run until `shutdown` resolves
pub async fn start_api_server<F>(config: &Config, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state, config.server.enable_cors);

    let addr = config.bind_address().parse::<SocketAddr>()?;
    let listener = TcpListener::bind(addr).await?;

    info!("Starting API server on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
