#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use ape_oracle::api::{router, AppState};
use ape_oracle::chat::ChatClient;
use ape_oracle::config::OpenRouterConfig;
use ape_oracle::metrics::Metrics;
use ape_oracle::store::{FeedStore, MemoryFeedStore};

pub fn app_state_with(store: Arc<dyn FeedStore>, openrouter: OpenRouterConfig) -> AppState {
    AppState::new(
        store,
        ChatClient::new(&openrouter).expect("chat client"),
        Metrics::new().expect("metrics"),
    )
}

/// State with an in-memory feed and an unconfigured chat upstream
pub fn memory_state() -> AppState {
    app_state_with(Arc::new(MemoryFeedStore::default()), OpenRouterConfig::default())
}

pub fn app(state: AppState) -> Router {
    router(state, true)
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("router response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, body)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}
