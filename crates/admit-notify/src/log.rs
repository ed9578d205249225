//! A backend that writes messages to the log instead of sending them.

use admit_core::notify::{Delivery, Message, NotificationBackend, SendError, SendFuture};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct LogBackend;

impl NotificationBackend for LogBackend {
  fn name(&self) -> &str { "log" }

  fn is_configured(&self) -> bool { true }

  fn send<'a>(&'a self, message: &'a Message) -> SendFuture<'a> {
    Box::pin(async move {
      let message_id = format!("log-{}", Uuid::new_v4());
      tracing::info!(
        to = %message.to,
        subject = %message.subject,
        message_id = %message_id,
        "email (log only)"
      );
      tracing::debug!(body = %message.text, "email body");
      Ok::<_, SendError>(Delivery { message_id: Some(message_id) })
    })
  }
}
