//! Fire-and-forget real-time broadcast sink.

/// Publishes small JSON payloads to live subscribers (signage screens,
/// dashboards). Delivery is best-effort: implementations swallow their own
/// failures and never block the caller.
pub trait Broadcaster: Send + Sync {
  fn publish(&self, topic: &str, payload: serde_json::Value);
}

/// A sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBroadcaster;

impl Broadcaster for NoopBroadcaster {
  fn publish(&self, _topic: &str, _payload: serde_json::Value) {}
}
