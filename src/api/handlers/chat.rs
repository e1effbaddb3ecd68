// Copyright (c) Ape Oracle Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::{ApiError, ApiResult, AppState};
use crate::chat::{ChatError, ChatMessage};

/// Body of `POST /chat`
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub content: String,
}

/// Forward a conversation to the completion API and return its reply
pub async fn chat_completion(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let Json(request) = payload?;
    if request.messages.is_empty() {
        return Err(ApiError::bad_request("Invalid or missing messages array"));
    }

    match state
        .chat
        .complete(&request.messages, request.model.as_deref())
        .await
    {
        Ok(content) => {
            state.metrics.record_chat("ok");
            Ok(Json(ChatResponse { content }))
        }
        Err(err) => {
            let outcome = match err {
                ChatError::Timeout(_) => "timeout",
                ChatError::NotConfigured => "not_configured",
                _ => "error",
            };
            state.metrics.record_chat(outcome);
            Err(err.into())
        }
    }
}
