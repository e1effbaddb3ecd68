// Copyright (c) Ape Oracle Team
// SPDX-License-Identifier: Apache-2.0

//! Translation of internal feed events into realtime wire messages.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{FeedEvent, FeedEventKind};
use crate::models::{LikeCount, SharedResponse};

/// A JSON text frame pushed to realtime clients:
/// `{"type": ..., "data": ..., "timestamp": <unix millis>}`
#[derive(Debug, Clone, Serialize)]
pub struct WireMessage {
    #[serde(flatten)]
    pub payload: WirePayload,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum WirePayload {
    NewResponse(SharedResponse),
    LikeUpdate(LikeCount),
    /// First frame on every connection
    Connected { subscribers: usize },
    /// Keepalive
    Ping,
}

impl WireMessage {
    fn at(payload: WirePayload, at: DateTime<Utc>) -> Self {
        Self {
            payload,
            timestamp: at.timestamp_millis(),
        }
    }

    pub fn connected(subscribers: usize) -> Self {
        Self::at(WirePayload::Connected { subscribers }, Utc::now())
    }

    pub fn ping() -> Self {
        Self::at(WirePayload::Ping, Utc::now())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl From<&FeedEvent> for WireMessage {
    fn from(event: &FeedEvent) -> Self {
        let payload = match &event.kind {
            FeedEventKind::NewResponse(response) => WirePayload::NewResponse(response.clone()),
            FeedEventKind::LikeUpdate(count) => WirePayload::LikeUpdate(count.clone()),
        };
        Self::at(payload, event.published_at)
    }
}
