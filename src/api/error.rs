// Copyright (c) Ape Oracle Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::chat::ChatError;
use crate::store::FeedError;

const UPSTREAM_MESSAGE: &str = "Failed to generate response. Please try again.";
const INTERNAL_MESSAGE: &str = "Internal server error";

/// Errors surfaced by HTTP handlers.
///
/// Client errors carry their message to the caller; upstream and internal
/// errors are logged with detail and answered with a generic message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::BadRequest(msg) | Self::NotFound(msg) => msg.clone(),
            Self::Upstream(_) => UPSTREAM_MESSAGE.to_string(),
            Self::Internal(_) => INTERNAL_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Upstream(detail) => error!(detail = %detail, "Chat upstream failure"),
            ApiError::Internal(detail) => error!(detail = %detail, "Internal error"),
            _ => debug!(message = %self, "Client error"),
        }

        let body = ErrorResponse {
            error: self.public_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<FeedError> for ApiError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::MissingField(_) => ApiError::bad_request("Missing required fields"),
            FeedError::NotFound(_) => ApiError::NotFound("Response not found".to_string()),
            FeedError::Storage(detail) => ApiError::Internal(detail),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(format!("Invalid query: {}", rejection.body_text()))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
