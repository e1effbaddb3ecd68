// Copyright (c) Ape Oracle Team
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use chrono::Utc;
use diesel::define_sql_function;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::Text;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::{AddOutcome, FeedError, FeedStore};
use crate::db::{Database, DbConnection};
use crate::events::{EventBus, FeedEvent};
use crate::models::like::NewLikeRow;
use crate::models::shared_response::{NewSharedResponseRow, SharedResponseRow};
use crate::models::{LikeUpdate, NewSharedResponse, SharedResponse};
use crate::schema::{response_likes, shared_responses};

/// Feed store backed by PostgreSQL, for deployments running more than one
/// process against the same feed.
///
/// Events are published after commit and only reach subscribers of this
/// process.
pub struct PgFeedStore {
    db: Arc<Database>,
    events: EventBus,
}

impl PgFeedStore {
    pub fn new(db: Arc<Database>, events: EventBus) -> Self {
        Self { db, events }
    }

    async fn get_connection(&self) -> Result<DbConnection, FeedError> {
        self.db
            .get_connection()
            .await
            .map_err(|e| FeedError::Storage(format!("Failed to get database connection: {}", e)))
    }
}

define_sql_function! {
    fn md5(x: Text) -> Text;
}

/// Rows sharing `input`'s dedup key. The `md5` clause matches the unique
/// index; the exact-content clause guards against hash collisions.
fn dedup_lookup(input: &NewSharedResponse) -> shared_responses::BoxedQuery<'_, Pg> {
    shared_responses::table
        .filter(md5(shared_responses::response_content).eq(md5(&input.response_content)))
        .filter(shared_responses::response_content.eq(&input.response_content))
        .filter(shared_responses::preset_id.eq(&input.preset_id))
        .filter(shared_responses::language_id.eq(&input.language_id))
        .into_boxed()
}

async fn find_by_key(
    conn: &mut DbConnection,
    input: &NewSharedResponse,
) -> Result<Option<SharedResponseRow>, FeedError> {
    let row = dedup_lookup(input)
        .select(SharedResponseRow::as_select())
        .first(conn)
        .await
        .optional()?;
    Ok(row)
}

async fn count_likes(conn: &mut DbConnection, response_id: &str) -> Result<u64, FeedError> {
    let count: i64 = response_likes::table
        .filter(response_likes::response_id.eq(response_id))
        .count()
        .get_result(conn)
        .await?;
    Ok(count.max(0) as u64)
}

#[async_trait]
impl FeedStore for PgFeedStore {
    async fn add_response(&self, input: NewSharedResponse) -> Result<AddOutcome, FeedError> {
        input.validate()?;
        let mut conn = self.get_connection().await?;

        if let Some(existing) = find_by_key(&mut conn, &input).await? {
            let like_count = count_likes(&mut conn, &existing.id).await?;
            debug!(response_id = %existing.id, "Duplicate share, returning existing response");
            return Ok(AddOutcome {
                response: existing.with_like_count(like_count),
                created: false,
            });
        }

        let candidate = input.clone().into_response(Utc::now());
        // The dedup index turns a concurrent identical share into a no-op insert.
        // The stored row is returned so the timestamp carries the column's precision.
        let inserted = diesel::insert_into(shared_responses::table)
            .values(NewSharedResponseRow::from(&candidate))
            .on_conflict_do_nothing()
            .returning(SharedResponseRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?;

        let Some(row) = inserted else {
            let existing = find_by_key(&mut conn, &input)
                .await?
                .ok_or_else(|| FeedError::Storage("Dedup conflict without a matching row".into()))?;
            let like_count = count_likes(&mut conn, &existing.id).await?;
            debug!(response_id = %existing.id, "Lost share race, returning existing response");
            return Ok(AddOutcome {
                response: existing.with_like_count(like_count),
                created: false,
            });
        };

        let response = row.with_like_count(0);
        info!(response_id = %response.id, preset_id = %response.preset_id, "Shared new response");
        self.events.publish(FeedEvent::new_response(response.clone()));

        Ok(AddOutcome {
            response,
            created: true,
        })
    }

    async fn toggle_like(&self, response_id: &str, user_id: &str) -> Result<LikeUpdate, FeedError> {
        let mut conn = self.get_connection().await?;

        let update = conn
            .transaction::<_, FeedError, _>(|conn| {
                async move {
                    // Row lock serializes toggles on the same response
                    let found = shared_responses::table
                        .filter(shared_responses::id.eq(response_id))
                        .select(shared_responses::id)
                        .for_update()
                        .first::<String>(conn)
                        .await
                        .optional()?;
                    if found.is_none() {
                        return Err(FeedError::NotFound(response_id.to_string()));
                    }

                    let removed = diesel::delete(
                        response_likes::table
                            .filter(response_likes::response_id.eq(response_id))
                            .filter(response_likes::user_id.eq(user_id)),
                    )
                    .execute(conn)
                    .await?;

                    let liked = removed == 0;
                    if liked {
                        diesel::insert_into(response_likes::table)
                            .values(NewLikeRow {
                                response_id,
                                user_id,
                                created_at: Utc::now(),
                            })
                            .execute(conn)
                            .await?;
                    }

                    let like_count: i64 = response_likes::table
                        .filter(response_likes::response_id.eq(response_id))
                        .count()
                        .get_result(conn)
                        .await?;

                    Ok(LikeUpdate {
                        response_id: response_id.to_string(),
                        like_count: like_count.max(0) as u64,
                        liked,
                    })
                }
                .scope_boxed()
            })
            .await?;

        debug!(%response_id, %user_id, liked = update.liked, like_count = update.like_count, "Toggled like");
        self.events
            .publish(FeedEvent::like_update(response_id, update.like_count));

        Ok(update)
    }

    async fn list_responses(&self) -> Result<Vec<SharedResponse>, FeedError> {
        let mut conn = self.get_connection().await?;

        let rows = shared_responses::table
            .order((shared_responses::created_at.desc(), shared_responses::seq.asc()))
            .select(SharedResponseRow::as_select())
            .load(&mut conn)
            .await?;

        let counts: HashMap<String, i64> = response_likes::table
            .group_by(response_likes::response_id)
            .select((response_likes::response_id, diesel::dsl::count_star()))
            .load::<(String, i64)>(&mut conn)
            .await?
            .into_iter()
            .collect();

        Ok(rows
            .into_iter()
            .map(|row| {
                let like_count = counts.get(&row.id).copied().unwrap_or(0).max(0) as u64;
                row.with_like_count(like_count)
            })
            .collect())
    }

    async fn is_liked_by(&self, response_id: &str, user_id: &str) -> Result<bool, FeedError> {
        let mut conn = self.get_connection().await?;
        let count: i64 = response_likes::table
            .filter(response_likes::response_id.eq(response_id))
            .filter(response_likes::user_id.eq(user_id))
            .count()
            .get_result(&mut conn)
            .await?;
        Ok(count > 0)
    }

    async fn liked_by(&self, user_id: &str) -> Result<Vec<String>, FeedError> {
        let mut conn = self.get_connection().await?;
        let ids = response_likes::table
            .inner_join(shared_responses::table)
            .filter(response_likes::user_id.eq(user_id))
            .order((shared_responses::created_at.desc(), shared_responses::seq.asc()))
            .select(shared_responses::id)
            .load::<String>(&mut conn)
            .await?;
        Ok(ids)
    }

    fn events(&self) -> &EventBus {
        &self.events
    }
}
