// Copyright (c) Ape Oracle Team
// SPDX-License-Identifier: Apache-2.0

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Service counters exposed at `/metrics`
pub struct Metrics {
    registry: Registry,
    pub shares: IntCounterVec,
    pub like_toggles: IntCounterVec,
    pub chat_requests: IntCounterVec,
    pub realtime_subscribers: IntGauge,
    pub realtime_lagged_events: IntCounter,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("ape_oracle".to_string()), None)?;

        let shares = IntCounterVec::new(
            Opts::new("feed_shares_total", "Share requests by outcome (created or duplicate)"),
            &["outcome"],
        )?;
        let like_toggles = IntCounterVec::new(
            Opts::new("feed_like_toggles_total", "Like toggles by resulting state (like or unlike)"),
            &["action"],
        )?;
        let chat_requests = IntCounterVec::new(
            Opts::new("chat_requests_total", "Chat proxy requests by outcome"),
            &["outcome"],
        )?;
        let realtime_subscribers = IntGauge::new(
            "realtime_subscribers",
            "Currently connected realtime feed clients",
        )?;
        let realtime_lagged_events = IntCounter::new(
            "realtime_lagged_events_total",
            "Feed events dropped for realtime clients that fell behind",
        )?;

        registry.register(Box::new(shares.clone()))?;
        registry.register(Box::new(like_toggles.clone()))?;
        registry.register(Box::new(chat_requests.clone()))?;
        registry.register(Box::new(realtime_subscribers.clone()))?;
        registry.register(Box::new(realtime_lagged_events.clone()))?;

        Ok(Self {
            registry,
            shares,
            like_toggles,
            chat_requests,
            realtime_subscribers,
            realtime_lagged_events,
        })
    }

    pub fn record_share(&self, created: bool) {
        let outcome = if created { "created" } else { "duplicate" };
        self.shares.with_label_values(&[outcome]).inc();
    }

    pub fn record_like(&self, liked: bool) {
        let action = if liked { "like" } else { "unlike" };
        self.like_toggles.with_label_values(&[action]).inc();
    }

    pub fn record_chat(&self, outcome: &str) {
        self.chat_requests.with_label_values(&[outcome]).inc();
    }

    /// Render every registered metric in the Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_recorded_values() {
        let metrics = Metrics::new().unwrap();
        metrics.record_share(true);
        metrics.record_share(false);
        metrics.record_share(false);
        metrics.record_like(true);
        metrics.record_chat("ok");
        metrics.realtime_subscribers.set(2);

        let text = metrics.render().unwrap();
        assert!(text.contains(r#"ape_oracle_feed_shares_total{outcome="duplicate"} 2"#));
        assert!(text.contains(r#"ape_oracle_feed_like_toggles_total{action="like"} 1"#));
        assert!(text.contains(r#"ape_oracle_chat_requests_total{outcome="ok"} 1"#));
        assert!(text.contains("ape_oracle_realtime_subscribers 2"));
    }

    #[test]
    fn registries_are_independent() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.record_like(false);
        assert!(!b.render().unwrap().contains(r#"action="unlike""#));
    }
}
