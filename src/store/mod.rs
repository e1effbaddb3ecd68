// Copyright (c) Ape Oracle Team
// SPDX-License-Identifier: Apache-2.0

//! Feed storage: shared responses and their like memberships.
//!
//! Every backend publishes exactly one event per accepted mutation on its
//! [`EventBus`], and nothing for duplicates or rejected calls.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::events::EventBus;
use crate::models::{FeedStats, LikeUpdate, NewSharedResponse, SharedResponse};

pub use memory::MemoryFeedStore;
pub use postgres::PgFeedStore;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("response not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<diesel::result::Error> for FeedError {
    fn from(err: diesel::result::Error) -> Self {
        FeedError::Storage(err.to_string())
    }
}

/// What `add_response` did with a share
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    pub response: SharedResponse,
    /// `false` when an existing record with the same dedup key was returned
    pub created: bool,
}

#[async_trait]
pub trait FeedStore: Send + Sync {
    /// Share a response, or return the existing record with the same
    /// content, preset and language.
    async fn add_response(&self, input: NewSharedResponse) -> Result<AddOutcome, FeedError>;

    /// Flip `user_id`'s like on a response and return the recounted total.
    async fn toggle_like(&self, response_id: &str, user_id: &str) -> Result<LikeUpdate, FeedError>;

    /// All responses, newest first; equal timestamps keep insertion order.
    async fn list_responses(&self) -> Result<Vec<SharedResponse>, FeedError>;

    async fn is_liked_by(&self, response_id: &str, user_id: &str) -> Result<bool, FeedError>;

    /// Ids of the responses `user_id` currently likes, in feed order.
    async fn liked_by(&self, user_id: &str) -> Result<Vec<String>, FeedError>;

    async fn stats(&self, top: usize) -> Result<FeedStats, FeedError> {
        let responses = self.list_responses().await?;
        Ok(FeedStats::from_feed(&responses, top))
    }

    fn events(&self) -> &EventBus;
}
