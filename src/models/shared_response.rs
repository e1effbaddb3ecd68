// Copyright (c) Ape Oracle Team
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::shared_responses;
use crate::store::FeedError;

/// A response shared to the public feed, with its current like count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedResponse {
    pub id: String,
    pub response_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_content: Option<String>,
    pub preset_id: String,
    pub language_id: String,
    pub user_prompt: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub like_count: u64,
}

/// Input for sharing a response to the feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSharedResponse {
    pub response_content: String,
    pub original_content: Option<String>,
    pub preset_id: String,
    pub language_id: String,
    pub user_prompt: String,
    pub user_id: String,
}

/// The tuple two shares must agree on to be considered the same response
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub response_content: String,
    pub preset_id: String,
    pub language_id: String,
}

impl NewSharedResponse {
    /// Content, preset and language identify a response; none may be empty.
    pub fn validate(&self) -> Result<(), FeedError> {
        if self.response_content.is_empty() {
            return Err(FeedError::MissingField("responseContent"));
        }
        if self.preset_id.is_empty() {
            return Err(FeedError::MissingField("presetId"));
        }
        if self.language_id.is_empty() {
            return Err(FeedError::MissingField("languageId"));
        }
        Ok(())
    }

    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            response_content: self.response_content.clone(),
            preset_id: self.preset_id.clone(),
            language_id: self.language_id.clone(),
        }
    }

    /// Materialize the record with a fresh id and zero likes
    pub fn into_response(self, timestamp: DateTime<Utc>) -> SharedResponse {
        SharedResponse {
            id: uuid::Uuid::new_v4().to_string(),
            response_content: self.response_content,
            original_content: self.original_content,
            preset_id: self.preset_id,
            language_id: self.language_id,
            user_prompt: self.user_prompt,
            user_id: self.user_id,
            timestamp,
            like_count: 0,
        }
    }
}

/// Row of the `shared_responses` table
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = shared_responses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SharedResponseRow {
    pub id: String,
    pub response_content: String,
    pub original_content: Option<String>,
    pub preset_id: String,
    pub language_id: String,
    pub user_prompt: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl SharedResponseRow {
    pub fn with_like_count(self, like_count: u64) -> SharedResponse {
        SharedResponse {
            id: self.id,
            response_content: self.response_content,
            original_content: self.original_content,
            preset_id: self.preset_id,
            language_id: self.language_id,
            user_prompt: self.user_prompt,
            user_id: self.user_id,
            timestamp: self.created_at,
            like_count,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = shared_responses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewSharedResponseRow<'a> {
    pub id: &'a str,
    pub response_content: &'a str,
    pub original_content: Option<&'a str>,
    pub preset_id: &'a str,
    pub language_id: &'a str,
    pub user_prompt: &'a str,
    pub user_id: &'a str,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a SharedResponse> for NewSharedResponseRow<'a> {
    fn from(response: &'a SharedResponse) -> Self {
        Self {
            id: &response.id,
            response_content: &response.response_content,
            original_content: response.original_content.as_deref(),
            preset_id: &response.preset_id,
            language_id: &response.language_id,
            user_prompt: &response.user_prompt,
            user_id: &response.user_id,
            created_at: response.timestamp,
        }
    }
}
