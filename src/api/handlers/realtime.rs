// Copyright (c) Ape Oracle Team
// SPDX-License-Identifier: Apache-2.0

//! WebSocket relay of feed events.
//!
//! Each connection holds its own event bus subscription for as long as the
//! socket is open. Frames are pushed best-effort: a client that cannot keep up
//! skips events, and a client that reconnects must re-fetch `GET /feed`.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{Sink, SinkExt, StreamExt};
use prometheus::IntGauge;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

use crate::api::AppState;
use crate::events::WireMessage;

/// WebSocket upgrade handler.
///
/// GET /feed/ws
pub async fn feed_socket(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_feed_socket(socket, state))
}

async fn handle_feed_socket(socket: WebSocket, state: AppState) {
    // Subscribe before greeting so nothing published after the greeting is missed
    let mut events = state.store.events().subscribe();
    let subscribers = state.store.events().subscriber_count();
    let _connected = ConnectedGauge::inc(&state.metrics.realtime_subscribers);
    info!(subscribers, "Realtime client connected");

    let (mut sender, mut receiver) = socket.split();

    if send_frame(&mut sender, &WireMessage::connected(subscribers)).await {
        let period = state.ping_interval();
        let start = Instant::now().checked_add(period).unwrap_or_else(Instant::now);
        let mut ping = interval_at(start, period);

        loop {
            tokio::select! {
                received = events.recv() => match received {
                    Ok(event) => {
                        if !send_frame(&mut sender, &WireMessage::from(&event)).await {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Realtime client fell behind, events dropped");
                        state.metrics.realtime_lagged_events.inc_by(skipped);
                    }
                    Err(RecvError::Closed) => break,
                },

                _ = ping.tick() => {
                    if !send_frame(&mut sender, &WireMessage::ping()).await {
                        break;
                    }
                }

                incoming = receiver.next() => match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {
                        // Client frames carry no commands
                    }
                    Some(Err(e)) => {
                        debug!("Realtime socket error: {}", e);
                        break;
                    }
                },
            }
        }
    }

    drop(events);
    info!(
        subscribers = state.store.events().subscriber_count(),
        "Realtime client disconnected"
    );
}

/// Holds one unit of the connected-clients gauge until dropped, unwinding included.
struct ConnectedGauge(IntGauge);

impl ConnectedGauge {
    fn inc(gauge: &IntGauge) -> Self {
        gauge.inc();
        Self(gauge.clone())
    }
}

impl Drop for ConnectedGauge {
    fn drop(&mut self) {
        self.0.dec();
    }
}

/// Send one frame; `false` means the client is gone.
async fn send_frame<S>(sender: &mut S, message: &WireMessage) -> bool
where
    S: Sink<Message> + Unpin,
{
    let json = match message.to_json() {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize realtime frame: {}", e);
            return true;
        }
    };
    sender.send(Message::Text(json)).await.is_ok()
}
