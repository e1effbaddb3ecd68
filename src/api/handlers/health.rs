// Copyright (c) Ape Oracle Team
// SPDX-License-Identifier: Apache-2.0

use axum::{response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
