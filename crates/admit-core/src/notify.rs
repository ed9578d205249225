//! Notification dispatch over an ordered fallback chain of backends.
//!
//! Each configured backend gets exactly one `send` per dispatch; the first
//! success wins and nothing after it is tried. There is no retry or backoff.
//! A send that outlives the dispatcher's timeout counts as a failure.
//! Callers treat failure as non-fatal: a purchase never rolls back because a
//! confirmation could not be delivered.

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use serde::Serialize;
use thiserror::Error;

// ─── Message ─────────────────────────────────────────────────────────────────

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
  pub to:      String,
  pub to_name: Option<String>,
  pub subject: String,
  pub text:    String,
  pub html:    String,
}

/// Successful hand-off to a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
  pub message_id: Option<String>,
}

/// A provider refused or failed to accept the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct SendError(pub String);

impl SendError {
  pub fn new(reason: impl Into<String>) -> Self { Self(reason.into()) }
}

pub type SendFuture<'a> =
  Pin<Box<dyn Future<Output = Result<Delivery, SendError>> + Send + 'a>>;

// ─── Backend trait ───────────────────────────────────────────────────────────

/// One interchangeable delivery provider.
///
/// Returns a boxed future so backends can be held as trait objects in a
/// heterogeneous chain.
pub trait NotificationBackend: Send + Sync {
  /// Stable name used in logs and attempt records.
  fn name(&self) -> &str;

  /// Whether the backend has everything it needs to attempt delivery.
  fn is_configured(&self) -> bool;

  fn send<'a>(&'a self, message: &'a Message) -> SendFuture<'a>;
}

// ─── Attempts ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
  Skipped,
  Delivered { message_id: Option<String> },
  Failed { reason: String },
}

/// What happened to one backend during one dispatch. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAttempt {
  pub backend: String,
  pub outcome: AttemptOutcome,
}

impl NotificationAttempt {
  pub fn was_sent(&self) -> bool { !matches!(self.outcome, AttemptOutcome::Skipped) }
}

/// Result of a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
  pub backend:  String,
  pub delivery: Delivery,
  pub attempts: Vec<NotificationAttempt>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
  #[error("no notification backend delivered the message ({} tried)", .attempts.iter().filter(|a| a.was_sent()).count())]
  AllProvidersFailed { attempts: Vec<NotificationAttempt> },
}

// ─── Dispatcher ──────────────────────────────────────────────────────────────

/// Upper bound on a single backend's `send` unless configured otherwise.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Walks an explicitly constructed, ordered list of backends.
#[derive(Clone)]
pub struct Dispatcher {
  backends: Vec<Arc<dyn NotificationBackend>>,
  timeout:  Duration,
}

impl Default for Dispatcher {
  fn default() -> Self { Self::new(Vec::new()) }
}

impl Dispatcher {
  pub fn new(backends: Vec<Arc<dyn NotificationBackend>>) -> Self {
    Self { backends, timeout: DEFAULT_SEND_TIMEOUT }
  }

  /// Bound each backend attempt by `timeout`.
  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn backend_names(&self) -> Vec<&str> {
    self.backends.iter().map(|b| b.name()).collect()
  }

  /// Deliver `message` through the first configured backend that accepts it.
  pub async fn dispatch(&self, message: &Message) -> Result<Dispatched, DispatchError> {
    let mut attempts = Vec::with_capacity(self.backends.len());

    for backend in &self.backends {
      let name = backend.name().to_owned();

      if !backend.is_configured() {
        tracing::debug!(backend = %name, "notification backend not configured, skipping");
        attempts.push(NotificationAttempt { backend: name, outcome: AttemptOutcome::Skipped });
        continue;
      }

      let sent = match tokio::time::timeout(self.timeout, backend.send(message)).await {
        Ok(result) => result,
        Err(_) => Err(SendError::new(format!("timed out after {:?}", self.timeout))),
      };

      match sent {
        Ok(delivery) => {
          tracing::info!(
            backend = %name,
            message_id = delivery.message_id.as_deref().unwrap_or("-"),
            "notification delivered"
          );
          attempts.push(NotificationAttempt {
            backend: name.clone(),
            outcome: AttemptOutcome::Delivered { message_id: delivery.message_id.clone() },
          });
          return Ok(Dispatched { backend: name, delivery, attempts });
        }
        Err(e) => {
          tracing::warn!(backend = %name, reason = %e, "notification backend failed, trying next");
          attempts.push(NotificationAttempt {
            backend: name,
            outcome: AttemptOutcome::Failed { reason: e.0 },
          });
        }
      }
    }

    Err(DispatchError::AllProvidersFailed { attempts })
  }
}
