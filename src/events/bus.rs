// Copyright (c) Ape Oracle Team
// SPDX-License-Identifier: Apache-2.0

//! In-process fan-out of feed events.
//!
//! Delivery is at-most-once with no history: a subscriber only sees events
//! published after it subscribed, and a subscriber that falls more than the
//! channel capacity behind loses the oldest events. Clients recover by
//! re-fetching the whole feed.

use tokio::sync::broadcast;
use tracing::trace;

use super::FeedEvent;

/// Default number of events buffered per subscriber.
pub const DEFAULT_EVENT_BUFFER: usize = 256;

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<FeedEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish to every current subscriber and return how many there were.
    ///
    /// Never fails: publishing with nobody listening drops the event.
    pub fn publish(&self, event: FeedEvent) -> usize {
        let response_id = event.response_id().to_string();
        match self.tx.send(event) {
            Ok(receivers) => {
                trace!(%response_id, receivers, "Published feed event");
                receivers
            }
            Err(_) => {
                trace!(%response_id, "Dropped feed event, no subscribers");
                0
            }
        }
    }

    /// Register a new subscriber. Dropping the receiver unregisters it.
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER)
    }
}
