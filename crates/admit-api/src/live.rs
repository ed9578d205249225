//! The live purchase feed: a [`Broadcaster`] backed by a bounded
//! `tokio::sync::broadcast` channel, streamed to clients as server-sent
//! events on `GET /live`.
//!
//! Subscribers that fall behind lose the oldest messages; publishers never
//! wait.

use std::convert::Infallible;

use admit_core::broadcast::Broadcaster;
use axum::{
  extract::State,
  response::sse::{Event, KeepAlive, Sse},
};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::{Stream, StreamExt as _, wrappers::BroadcastStream};

pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize)]
pub struct LiveMessage {
  pub topic:   String,
  pub payload: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct LiveFeed {
  tx: broadcast::Sender<LiveMessage>,
}

impl Default for LiveFeed {
  fn default() -> Self { Self::new(DEFAULT_CAPACITY) }
}

impl LiveFeed {
  pub fn new(capacity: usize) -> Self {
    let (tx, _) = broadcast::channel(capacity.max(1));
    Self { tx }
  }

  pub fn subscribe(&self) -> broadcast::Receiver<LiveMessage> { self.tx.subscribe() }
}

impl Broadcaster for LiveFeed {
  fn publish(&self, topic: &str, payload: serde_json::Value) {
    let message = LiveMessage { topic: topic.to_owned(), payload };
    // Fails only when nobody is listening.
    if let Ok(receivers) = self.tx.send(message) {
      tracing::trace!(topic, receivers, "live message published");
    }
  }
}

/// `GET /live`: one SSE event per published message, named by topic.
pub async fn stream(
  State(feed): State<LiveFeed>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
  let messages = BroadcastStream::new(feed.subscribe()).filter_map(|received| match received {
    Ok(m) => Event::default().event(m.topic).json_data(m.payload).ok().map(Ok),
    Err(lagged) => {
      tracing::debug!(error = %lagged, "live subscriber lagging");
      None
    }
  });
  Sse::new(messages).keep_alive(KeepAlive::default())
}
