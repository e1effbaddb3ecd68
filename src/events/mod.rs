// Copyright (c) Ape Oracle Team
// SPDX-License-Identifier: Apache-2.0

pub mod bus;
pub mod feed_events;
pub mod wire;

pub use bus::EventBus;
pub use feed_events::{FeedEvent, FeedEventKind};
pub use wire::{WireMessage, WirePayload};
