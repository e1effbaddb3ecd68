// Copyright (c) Ape Oracle Team
// SPDX-License-Identifier: Apache-2.0

pub mod like;
pub mod shared_response;
pub mod stats;

pub use like::{LikeCount, LikeUpdate};
pub use shared_response::{NewSharedResponse, SharedResponse};
pub use stats::FeedStats;
