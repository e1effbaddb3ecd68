// Copyright (c) Ape Oracle Team
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::SharedResponse;

pub const DEFAULT_TOP_LIKED: usize = 5;
pub const MAX_TOP_LIKED: usize = 50;

/// Aggregate view of the feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedStats {
    pub shared_count: usize,
    pub total_likes: u64,
    pub top_liked_responses: Vec<SharedResponse>,
    pub preset_distribution: Vec<PresetCount>,
    pub language_distribution: Vec<LanguageCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetCount {
    pub preset_id: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageCount {
    pub language_id: String,
    pub count: usize,
}

impl FeedStats {
    /// Compute stats from a newest-first feed listing.
    ///
    /// Ties in like count keep feed order, so the newer of two equally liked
    /// responses ranks first. Distributions are ordered by count, then id.
    pub fn from_feed(responses: &[SharedResponse], top: usize) -> Self {
        let mut top_liked: Vec<SharedResponse> = responses.to_vec();
        top_liked.sort_by(|a, b| b.like_count.cmp(&a.like_count));
        top_liked.truncate(top);

        let preset_distribution = count_by(responses, |r| &r.preset_id)
            .into_iter()
            .map(|(preset_id, count)| PresetCount { preset_id, count })
            .collect();
        let language_distribution = count_by(responses, |r| &r.language_id)
            .into_iter()
            .map(|(language_id, count)| LanguageCount { language_id, count })
            .collect();

        Self {
            shared_count: responses.len(),
            total_likes: responses.iter().map(|r| r.like_count).sum(),
            top_liked_responses: top_liked,
            preset_distribution,
            language_distribution,
        }
    }
}

fn count_by<F>(responses: &[SharedResponse], key: F) -> Vec<(String, usize)>
where
    F: Fn(&SharedResponse) -> &String,
{
    let mut counts: HashMap<&String, usize> = HashMap::new();
    for response in responses {
        *counts.entry(key(response)).or_default() += 1;
    }
    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(id, count)| (id.clone(), count))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}
