// Copyright (c) Ape Oracle Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::{ApiError, ApiResult, AppState};
use crate::models::stats::{DEFAULT_TOP_LIKED, MAX_TOP_LIKED};
use crate::models::{FeedStats, LikeUpdate, NewSharedResponse, SharedResponse};

/// Body of `POST /feed/share`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    pub response_content: Option<String>,
    pub original_content: Option<String>,
    pub preset_id: Option<String>,
    pub language_id: Option<String>,
    pub user_prompt: Option<String>,
    pub user_id: Option<String>,
}

/// Body of `POST /feed/like`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    pub response_id: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedResponse {
    pub user_id: String,
    pub response_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub top: Option<usize>,
}

fn required(value: Option<String>) -> ApiResult<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing required fields"))
}

impl ShareRequest {
    fn into_input(self) -> ApiResult<NewSharedResponse> {
        Ok(NewSharedResponse {
            response_content: required(self.response_content)?,
            original_content: self.original_content.filter(|v| !v.is_empty()),
            preset_id: required(self.preset_id)?,
            language_id: required(self.language_id)?,
            user_prompt: self.user_prompt.unwrap_or_default(),
            user_id: required(self.user_id)?,
        })
    }
}

/// All shared responses, newest first
pub async fn get_feed(State(state): State<AppState>) -> ApiResult<Json<Vec<SharedResponse>>> {
    let responses = state.store.list_responses().await?;
    debug!(count = responses.len(), "Fetched feed");
    Ok(Json(responses))
}

/// Share a response; an identical share returns the existing record
pub async fn share_response(
    State(state): State<AppState>,
    payload: Result<Json<ShareRequest>, JsonRejection>,
) -> ApiResult<Json<SharedResponse>> {
    let Json(request) = payload?;
    let input = request.into_input()?;

    let outcome = state.store.add_response(input).await?;
    state.metrics.record_share(outcome.created);

    Ok(Json(outcome.response))
}

/// Like or unlike a response for a user
pub async fn toggle_like(
    State(state): State<AppState>,
    payload: Result<Json<LikeRequest>, JsonRejection>,
) -> ApiResult<Json<LikeUpdate>> {
    let Json(request) = payload?;
    let response_id = required(request.response_id)?;
    let user_id = required(request.user_id)?;

    let update = state.store.toggle_like(&response_id, &user_id).await?;
    state.metrics.record_like(update.liked);

    Ok(Json(update))
}

/// Ids of the responses a user currently likes
pub async fn get_liked(
    State(state): State<AppState>,
    query: Result<Query<LikedQuery>, QueryRejection>,
) -> ApiResult<Json<LikedResponse>> {
    let Query(query) = query?;
    let user_id = query
        .user_id
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing userId"))?;

    let response_ids = state.store.liked_by(&user_id).await?;
    Ok(Json(LikedResponse {
        user_id,
        response_ids,
    }))
}

/// Aggregate feed statistics
pub async fn get_stats(
    State(state): State<AppState>,
    query: Result<Query<StatsQuery>, QueryRejection>,
) -> ApiResult<Json<FeedStats>> {
    let Query(query) = query?;
    let top = query.top.unwrap_or(DEFAULT_TOP_LIKED).min(MAX_TOP_LIKED);

    let stats = state.store.stats(top).await?;
    Ok(Json(stats))
}
