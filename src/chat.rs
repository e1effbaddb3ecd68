// Copyright (c) Ape Oracle Team
// SPDX-License-Identifier: Apache-2.0

//! Pass-through client for an OpenRouter-compatible chat completions API.

use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::OpenRouterConfig;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat API key is not configured")]
    NotConfigured,

    #[error("chat request timed out after {0:?}")]
    Timeout(Duration),

    #[error("chat request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("chat upstream returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("invalid response from chat upstream: {0}")]
    InvalidResponse(String),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct ChatClient {
    http: reqwest::Client,
    api_key: Option<String>,
    completions_url: String,
    default_model: String,
    timeout: Duration,
}

impl ChatClient {
    pub fn new(config: &OpenRouterConfig) -> Result<Self, ChatError> {
        let mut headers = HeaderMap::new();
        headers.insert("http-referer", HeaderValue::from_str(&config.referer)?);
        headers.insert("x-title", HeaderValue::from_str(&config.title)?);

        let timeout = Duration::from_secs(config.timeout_secs);
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(ChatError::Client)?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            completions_url: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            default_model: config.default_model.clone(),
            timeout,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send one completion request and return the first choice's text.
    pub async fn complete(&self, messages: &[ChatMessage], model: Option<&str>) -> Result<String, ChatError> {
        let api_key = self.api_key.as_deref().ok_or(ChatError::NotConfigured)?;
        let model = model.filter(|m| !m.is_empty()).unwrap_or(&self.default_model);

        debug!(%model, messages = messages.len(), "Sending chat completion request");

        let response = self
            .http
            .post(&self.completions_url)
            .bearer_auth(api_key)
            .json(&CompletionRequest { model, messages })
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, %body, "Chat upstream returned an error");
            return Err(ChatError::Status { status, body });
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ChatError::Timeout(self.timeout)
            } else {
                ChatError::InvalidResponse(e.to_string())
            }
        })?;

        let message = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .ok_or_else(|| ChatError::InvalidResponse("no choices in completion".into()))?;

        Ok(message.content.unwrap_or_default())
    }

    fn classify(&self, err: reqwest::Error) -> ChatError {
        if err.is_timeout() {
            ChatError::Timeout(self.timeout)
        } else {
            ChatError::Transport(err)
        }
    }
}
