// Copyright (c) Ape Oracle Team
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{AddOutcome, FeedError, FeedStore};
use crate::events::{EventBus, FeedEvent};
use crate::models::shared_response::DedupKey;
use crate::models::{LikeUpdate, NewSharedResponse, SharedResponse};

/// Process-local feed store.
///
/// A single lock covers the whole state; mutations publish while holding it,
/// so subscribers see events in mutation order.
pub struct MemoryFeedStore {
    inner: RwLock<Inner>,
    events: EventBus,
}

#[derive(Default)]
struct Inner {
    /// Insertion order
    responses: Vec<SharedResponse>,
    by_id: HashMap<String, usize>,
    by_key: HashMap<DedupKey, usize>,
    /// response id -> users who like it
    likes: HashMap<String, HashSet<String>>,
}

impl Inner {
    fn newest_first(&self) -> Vec<SharedResponse> {
        let mut responses = self.responses.clone();
        // Stable sort keeps insertion order among equal timestamps
        responses.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        responses
    }
}

impl MemoryFeedStore {
    pub fn new(events: EventBus) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            events,
        }
    }

    /// Share with an explicit creation time.
    pub async fn add_response_at(
        &self,
        input: NewSharedResponse,
        timestamp: DateTime<Utc>,
    ) -> Result<AddOutcome, FeedError> {
        input.validate()?;
        let key = input.dedup_key();

        let mut inner = self.inner.write().await;
        if let Some(&index) = inner.by_key.get(&key) {
            let existing = inner.responses[index].clone();
            debug!(response_id = %existing.id, "Duplicate share, returning existing response");
            return Ok(AddOutcome {
                response: existing,
                created: false,
            });
        }

        let response = input.into_response(timestamp);
        let index = inner.responses.len();
        inner.by_id.insert(response.id.clone(), index);
        inner.by_key.insert(key, index);
        inner.responses.push(response.clone());

        info!(response_id = %response.id, preset_id = %response.preset_id, "Shared new response");
        self.events.publish(FeedEvent::new_response(response.clone()));

        Ok(AddOutcome {
            response,
            created: true,
        })
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.responses.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryFeedStore {
    fn default() -> Self {
        Self::new(EventBus::default())
    }
}

#[async_trait]
impl FeedStore for MemoryFeedStore {
    async fn add_response(&self, input: NewSharedResponse) -> Result<AddOutcome, FeedError> {
        self.add_response_at(input, Utc::now()).await
    }

    async fn toggle_like(&self, response_id: &str, user_id: &str) -> Result<LikeUpdate, FeedError> {
        let mut inner = self.inner.write().await;
        let index = *inner
            .by_id
            .get(response_id)
            .ok_or_else(|| FeedError::NotFound(response_id.to_string()))?;

        let likers = inner.likes.entry(response_id.to_string()).or_default();
        let liked = if likers.remove(user_id) {
            false
        } else {
            likers.insert(user_id.to_string());
            true
        };
        let like_count = likers.len() as u64;
        inner.responses[index].like_count = like_count;

        debug!(%response_id, %user_id, liked, like_count, "Toggled like");
        self.events.publish(FeedEvent::like_update(response_id, like_count));

        Ok(LikeUpdate {
            response_id: response_id.to_string(),
            like_count,
            liked,
        })
    }

    async fn list_responses(&self) -> Result<Vec<SharedResponse>, FeedError> {
        Ok(self.inner.read().await.newest_first())
    }

    async fn is_liked_by(&self, response_id: &str, user_id: &str) -> Result<bool, FeedError> {
        let inner = self.inner.read().await;
        Ok(inner
            .likes
            .get(response_id)
            .is_some_and(|likers| likers.contains(user_id)))
    }

    async fn liked_by(&self, user_id: &str) -> Result<Vec<String>, FeedError> {
        let inner = self.inner.read().await;
        Ok(inner
            .newest_first()
            .into_iter()
            .filter(|r| {
                inner
                    .likes
                    .get(&r.id)
                    .is_some_and(|likers| likers.contains(user_id))
            })
            .map(|r| r.id)
            .collect())
    }

    fn events(&self) -> &EventBus {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::FeedEventKind;
    use chrono::Duration;
    use std::sync::Arc;
    use tokio::sync::broadcast::error::TryRecvError;
    use tokio_test::assert_ok;
    use tracing_test::traced_test;

    fn share(content: &str, preset: &str, language: &str, user: &str) -> NewSharedResponse {
        NewSharedResponse {
            response_content: content.into(),
            original_content: None,
            preset_id: preset.into(),
            language_id: language.into(),
            user_prompt: "Q?".into(),
            user_id: user.into(),
        }
    }

    #[tokio::test]
    async fn oracle_like_scenario() {
        let store = MemoryFeedStore::default();
        let added = store.add_response(share("Yes.", "oracle", "en", "u1")).await.unwrap();
        assert!(added.created);
        assert_eq!(added.response.like_count, 0);
        let id = added.response.id;

        let first = store.toggle_like(&id, "u1").await.unwrap();
        assert_eq!((first.like_count, first.liked), (1, true));

        let second = store.toggle_like(&id, "u1").await.unwrap();
        assert_eq!((second.like_count, second.liked), (0, false));

        let third = store.toggle_like(&id, "u2").await.unwrap();
        assert_eq!((third.like_count, third.liked), (1, true));
        assert_eq!(third.response_id, id);
    }

    #[tokio::test]
    async fn duplicate_share_returns_existing_record() {
        let store = MemoryFeedStore::default();
        let first = store.add_response(share("Yes.", "oracle", "en", "u1")).await.unwrap();
        store.toggle_like(&first.response.id, "u3").await.unwrap();

        let mut again = share("Yes.", "oracle", "en", "u2");
        again.user_prompt = "A different question?".into();
        let second = store.add_response(again).await.unwrap();

        assert!(!second.created);
        assert_eq!(second.response.id, first.response.id);
        assert_eq!(second.response.like_count, 1);
        assert_eq!(second.response.user_id, "u1");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn dedup_key_includes_preset_and_language() {
        let store = MemoryFeedStore::default();
        let a = store.add_response(share("Yes.", "oracle", "en", "u1")).await.unwrap();
        let b = store.add_response(share("Yes.", "oracle", "fr", "u1")).await.unwrap();
        let c = store.add_response(share("Yes.", "sage", "en", "u1")).await.unwrap();

        assert!(b.created && c.created);
        assert_ne!(a.response.id, b.response.id);
        assert_ne!(a.response.id, c.response.id);
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn rejects_empty_identity_fields() {
        let store = MemoryFeedStore::default();
        let mut rx = store.events().subscribe();

        let err = store.add_response(share("", "oracle", "en", "u1")).await.unwrap_err();
        assert!(matches!(err, FeedError::MissingField("responseContent")));
        assert!(store.is_empty().await);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn toggle_unknown_response_is_not_found_and_changes_nothing() {
        let store = MemoryFeedStore::default();
        let added = store.add_response(share("Yes.", "oracle", "en", "u1")).await.unwrap();
        let mut rx = store.events().subscribe();

        let err = store.toggle_like("missing", "u1").await.unwrap_err();
        assert!(matches!(err, FeedError::NotFound(ref id) if id == "missing"));

        let feed = store.list_responses().await.unwrap();
        assert_eq!(feed, vec![added.response]);
        assert!(!assert_ok!(store.is_liked_by("missing", "u1").await));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn like_count_equals_distinct_likers_in_any_order() {
        let store = MemoryFeedStore::default();
        let id = store
            .add_response(share("Outlook good.", "oracle", "en", "u0"))
            .await
            .unwrap()
            .response
            .id;

        for user in ["u5", "u2", "u9", "u1"] {
            store.toggle_like(&id, user).await.unwrap();
        }
        let feed = store.list_responses().await.unwrap();
        assert_eq!(feed[0].like_count, 4);

        for user in ["u5", "u2", "u9", "u1"] {
            assert!(store.is_liked_by(&id, user).await.unwrap());
        }
        assert!(!store.is_liked_by(&id, "u0").await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_likes_from_distinct_users_all_count() {
        let store = Arc::new(MemoryFeedStore::default());
        let id = store
            .add_response(share("Most likely.", "oracle", "en", "u0"))
            .await
            .unwrap()
            .response
            .id;

        let handles: Vec<_> = (0..32)
            .map(|n| {
                let store = store.clone();
                let id = id.clone();
                tokio::spawn(async move { store.toggle_like(&id, &format!("user-{n}")).await })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().unwrap().liked);
        }

        assert_eq!(store.list_responses().await.unwrap()[0].like_count, 32);
    }

    #[tokio::test]
    async fn concurrent_identical_shares_create_one_record() {
        let store = Arc::new(MemoryFeedStore::default());
        let handles: Vec<_> = (0..16)
            .map(|n| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .add_response(share("Cannot predict now.", "oracle", "en", &format!("u{n}")))
                        .await
                })
            })
            .collect();

        let mut ids = HashSet::new();
        let mut created = 0;
        for handle in handles {
            let outcome = handle.await.unwrap().unwrap();
            ids.insert(outcome.response.id);
            created += usize::from(outcome.created);
        }
        assert_eq!(ids.len(), 1);
        assert_eq!(created, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn lists_newest_first_regardless_of_insertion_order() {
        let store = MemoryFeedStore::default();
        let now = Utc::now();
        let offsets = [30, 10, 50, 0, 20];
        for (n, offset) in offsets.iter().enumerate() {
            store
                .add_response_at(
                    share(&format!("answer {n}"), "oracle", "en", "u1"),
                    now - Duration::seconds(*offset),
                )
                .await
                .unwrap();
        }

        let feed = store.list_responses().await.unwrap();
        assert_eq!(feed.len(), offsets.len());
        assert!(feed.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        assert_eq!(feed[0].response_content, "answer 3");
        assert_eq!(feed[4].response_content, "answer 2");
    }

    #[tokio::test]
    async fn equal_timestamps_keep_insertion_order() {
        let store = MemoryFeedStore::default();
        let at = Utc::now();
        for n in 0..3 {
            store
                .add_response_at(share(&format!("answer {n}"), "oracle", "en", "u1"), at)
                .await
                .unwrap();
        }
        let contents: Vec<String> = store
            .list_responses()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.response_content)
            .collect();
        assert_eq!(contents, vec!["answer 0", "answer 1", "answer 2"]);
    }

    #[tokio::test]
    async fn publishes_one_event_per_accepted_mutation() {
        let store = MemoryFeedStore::default();
        let mut rx = store.events().subscribe();

        let added = store.add_response(share("Yes.", "oracle", "en", "u1")).await.unwrap();
        store.add_response(share("Yes.", "oracle", "en", "u2")).await.unwrap();
        store.toggle_like(&added.response.id, "u1").await.unwrap();
        store.toggle_like(&added.response.id, "u1").await.unwrap();

        match rx.recv().await.unwrap().kind {
            FeedEventKind::NewResponse(response) => assert_eq!(response, added.response),
            other => panic!("expected new-response, got {other:?}"),
        }
        for expected in [1, 0] {
            match rx.recv().await.unwrap().kind {
                FeedEventKind::LikeUpdate(count) => {
                    assert_eq!(count.response_id, added.response.id);
                    assert_eq!(count.like_count, expected);
                }
                other => panic!("expected like-update, got {other:?}"),
            }
        }
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn liked_by_follows_feed_order() {
        let store = MemoryFeedStore::default();
        let now = Utc::now();
        let older = store
            .add_response_at(share("Older.", "oracle", "en", "u1"), now - Duration::seconds(5))
            .await
            .unwrap()
            .response
            .id;
        let newer = store
            .add_response_at(share("Newer.", "oracle", "en", "u1"), now)
            .await
            .unwrap()
            .response
            .id;
        let unliked = store
            .add_response_at(share("Unliked.", "oracle", "en", "u1"), now)
            .await
            .unwrap()
            .response
            .id;

        store.toggle_like(&older, "fan").await.unwrap();
        store.toggle_like(&newer, "fan").await.unwrap();
        store.toggle_like(&unliked, "someone-else").await.unwrap();

        assert_eq!(store.liked_by("fan").await.unwrap(), vec![newer, older]);
        assert!(store.liked_by("nobody").await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn liked_by_sees_one_consistent_state() {
        let store = Arc::new(MemoryFeedStore::default());
        let first = store.add_response(share("R0", "oracle", "en", "u1")).await.unwrap();
        store.toggle_like(&first.response.id, "fan").await.unwrap();

        // The fan always likes at least one response: a new one is shared and
        // liked before the previous one is unliked.
        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut previous = first.response.id;
                for i in 1..200 {
                    let next = store
                        .add_response(share(&format!("R{i}"), "oracle", "en", "u1"))
                        .await
                        .unwrap()
                        .response
                        .id;
                    store.toggle_like(&next, "fan").await.unwrap();
                    store.toggle_like(&previous, "fan").await.unwrap();
                    previous = next;
                }
            })
        };

        while !writer.is_finished() {
            let liked = store.liked_by("fan").await.unwrap();
            assert!(!liked.is_empty());
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();
        assert_eq!(store.liked_by("fan").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stats_reflect_current_like_counts() {
        let store = MemoryFeedStore::default();
        let a = store.add_response(share("A", "oracle", "en", "u1")).await.unwrap().response.id;
        store.add_response(share("B", "sage", "en", "u1")).await.unwrap();
        store.toggle_like(&a, "u1").await.unwrap();
        store.toggle_like(&a, "u2").await.unwrap();

        let stats = store.stats(1).await.unwrap();
        assert_eq!(stats.shared_count, 2);
        assert_eq!(stats.total_likes, 2);
        assert_eq!(stats.top_liked_responses.len(), 1);
        assert_eq!(stats.top_liked_responses[0].id, a);
    }

    #[tokio::test]
    #[traced_test]
    async fn logs_duplicate_shares() {
        let store = MemoryFeedStore::default();
        store.add_response(share("Yes.", "oracle", "en", "u1")).await.unwrap();
        store.add_response(share("Yes.", "oracle", "en", "u1")).await.unwrap();
        assert!(logs_contain("Duplicate share, returning existing response"));
    }
}
