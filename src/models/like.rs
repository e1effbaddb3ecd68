// Copyright (c) Ape Oracle Team
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::response_likes;

/// Result of toggling a like, returned to the user who toggled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeUpdate {
    pub response_id: String,
    pub like_count: u64,
    pub liked: bool,
}

/// New like count of a response, broadcast to every subscriber
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeCount {
    pub response_id: String,
    pub like_count: u64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = response_likes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewLikeRow<'a> {
    pub response_id: &'a str,
    pub user_id: &'a str,
    pub created_at: DateTime<Utc>,
}
