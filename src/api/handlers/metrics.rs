// Copyright (c) Ape Oracle Team
// SPDX-License-Identifier: Apache-2.0

use axum::{extract::State, http::header, response::IntoResponse};

use crate::api::{ApiError, ApiResult, AppState};

/// Prometheus scrape endpoint
pub async fn get_metrics(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let body = state
        .metrics
        .render()
        .map_err(|e| ApiError::internal(format!("Failed to render metrics: {}", e)))?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}
