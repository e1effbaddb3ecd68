// Copyright (c) Ape Oracle Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

/// Build the application router with all routes
pub fn router(state: AppState, enable_cors: bool) -> Router {
    let app = Router::new()
        // General routes
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::get_metrics))

        // Chat proxy
        .route("/chat", post(handlers::chat::chat_completion))

        // Feed routes
        .route("/feed", get(handlers::feed::get_feed))
        .route("/feed/share", post(handlers::feed::share_response))
        .route("/feed/like", post(handlers::feed::toggle_like))
        .route("/feed/liked", get(handlers::feed::get_liked))
        .route("/feed/stats", get(handlers::feed::get_stats))

        // Realtime channel
        .route("/feed/ws", get(handlers::realtime::feed_socket))

        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}
