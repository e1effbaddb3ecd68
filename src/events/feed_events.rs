// Copyright (c) Ape Oracle Team
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};

use crate::models::{LikeCount, SharedResponse};

/// A mutation accepted by the feed store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEvent {
    pub kind: FeedEventKind,
    /// When the store published the event
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEventKind {
    /// A response was shared for the first time
    NewResponse(SharedResponse),
    /// A like toggle changed the like count of a response
    LikeUpdate(LikeCount),
}

impl FeedEvent {
    pub fn new_response(response: SharedResponse) -> Self {
        Self {
            kind: FeedEventKind::NewResponse(response),
            published_at: Utc::now(),
        }
    }

    pub fn like_update(response_id: impl Into<String>, like_count: u64) -> Self {
        Self {
            kind: FeedEventKind::LikeUpdate(LikeCount {
                response_id: response_id.into(),
                like_count,
            }),
            published_at: Utc::now(),
        }
    }

    /// Id of the response the event concerns
    pub fn response_id(&self) -> &str {
        match &self.kind {
            FeedEventKind::NewResponse(response) => &response.id,
            FeedEventKind::LikeUpdate(count) => &count.response_id,
        }
    }
}
