//! Concrete notification backends for Admit.
//!
//! [`build_chain`] turns a [`NotificationConfig`] into the ordered backend list
//! handed to [`admit_core::notify::Dispatcher`]. It runs once at startup;
//! nothing here reads the environment on its own.

pub mod config;
pub mod error;
mod http;
mod log;
mod smtp;
mod template;

use std::{fmt, sync::Arc};

use admit_core::notify::NotificationBackend;

pub use config::NotificationConfig;
pub use error::{Error, Result};
pub use http::{ResendBackend, SendGridBackend};
pub use log::LogBackend;
pub use smtp::SmtpBackend;
pub use template::{Confirmation, TicketImage, confirmation_message, format_amount};

/// The `From:` identity shared by every backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
  pub email: String,
  pub name:  Option<String>,
}

impl fmt::Display for Sender {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.name {
      Some(name) => write!(f, "{name} <{}>", self.email),
      None => f.write_str(&self.email),
    }
  }
}

/// Build the fallback chain in `config.order`.
///
/// Names are matched case-insensitively. An unknown name is a configuration
/// error; a known backend without credentials is kept and skipped at
/// dispatch time. Outbound HTTP and SMTP calls are bounded by
/// `config.send_timeout_ms`.
pub fn build_chain(config: &NotificationConfig) -> Result<Vec<Arc<dyn NotificationBackend>>> {
  let from = Sender { email: config.from_email.clone(), name: config.from_name.clone() };
  let client = reqwest::Client::builder().timeout(config.send_timeout()).build()?;

  let mut chain: Vec<Arc<dyn NotificationBackend>> = Vec::with_capacity(config.order.len());
  for name in &config.order {
    let backend: Arc<dyn NotificationBackend> = match name.trim().to_ascii_lowercase().as_str() {
      "resend" => Arc::new(ResendBackend::new(client.clone(), &config.resend, from.clone())),
      "sendgrid" => Arc::new(SendGridBackend::new(client.clone(), &config.sendgrid, from.clone())),
      "smtp" => Arc::new(SmtpBackend::new(&config.smtp, from.clone(), config.send_timeout())?),
      "log" => Arc::new(LogBackend),
      _ => return Err(Error::UnknownBackend(name.clone())),
    };
    tracing::debug!(backend = backend.name(), configured = backend.is_configured(), "notification backend");
    chain.push(backend);
  }
  Ok(chain)
}

#[cfg(test)]
mod tests {
  use admit_core::notify::{AttemptOutcome, Dispatcher, Message};

  use super::*;

  fn names(chain: &[Arc<dyn NotificationBackend>]) -> Vec<&str> {
    chain.iter().map(|b| b.name()).collect()
  }

  #[test]
  fn default_chain_is_resend_sendgrid_smtp() {
    let chain = build_chain(&NotificationConfig::default()).unwrap();
    assert_eq!(names(&chain), ["resend", "sendgrid", "smtp"]);
    assert!(chain.iter().all(|b| !b.is_configured()));
  }

  #[test]
  fn chain_follows_configured_order() {
    let config = NotificationConfig {
      order: vec!["Log".into(), "smtp".into(), "resend".into()],
      ..NotificationConfig::default()
    };
    let chain = build_chain(&config).unwrap();
    assert_eq!(names(&chain), ["log", "smtp", "resend"]);
  }

  #[test]
  fn unknown_backend_is_rejected() {
    let config = NotificationConfig { order: vec!["pigeon".into()], ..NotificationConfig::default() };
    assert!(matches!(build_chain(&config), Err(Error::UnknownBackend(n)) if n == "pigeon"));
  }

  #[test]
  fn config_deserializes_with_defaults() {
    let config: NotificationConfig =
      serde_json::from_value(serde_json::json!({ "resend": { "api_key": "re_x" } })).unwrap();
    assert_eq!(config.order, ["resend", "sendgrid", "smtp"]);
    assert_eq!(config.resend.endpoint, config::RESEND_ENDPOINT);
    assert!(config.smtp.starttls);
    assert_eq!(config.send_timeout(), std::time::Duration::from_secs(10));
  }

  #[test]
  fn sender_display() {
    let named = Sender { email: "a@b.c".into(), name: Some("Box Office".into()) };
    assert_eq!(named.to_string(), "Box Office <a@b.c>");
    let bare = Sender { email: "a@b.c".into(), name: None };
    assert_eq!(bare.to_string(), "a@b.c");
  }

  #[tokio::test]
  async fn unconfigured_backends_fall_through_to_log() {
    let config = NotificationConfig {
      order: vec!["resend".into(), "sendgrid".into(), "log".into()],
      ..NotificationConfig::default()
    };
    let dispatcher = Dispatcher::new(build_chain(&config).unwrap());
    let message = Message {
      to:      "alice@example.com".into(),
      to_name: None,
      subject: "s".into(),
      text:    "t".into(),
      html:    "h".into(),
    };

    let dispatched = dispatcher.dispatch(&message).await.unwrap();
    assert_eq!(dispatched.backend, "log");
    assert_eq!(dispatched.attempts[0].outcome, AttemptOutcome::Skipped);
    assert_eq!(dispatched.attempts[1].outcome, AttemptOutcome::Skipped);
    assert!(dispatched.delivery.message_id.is_some());
  }

  #[tokio::test]
  async fn silent_provider_does_not_stall_the_chain() {
    // Accepts connections and never writes a byte back.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      let mut held = Vec::new();
      while let Ok((socket, _)) = listener.accept().await {
        held.push(socket);
      }
    });

    let config = NotificationConfig {
      order: vec!["resend".into(), "log".into()],
      resend: config::ResendConfig { api_key: "re_key".into(), endpoint: format!("http://{addr}/") },
      send_timeout_ms: 200,
      ..NotificationConfig::default()
    };
    let dispatcher =
      Dispatcher::new(build_chain(&config).unwrap()).with_timeout(config.send_timeout());
    let message = Message {
      to:      "alice@example.com".into(),
      to_name: None,
      subject: "s".into(),
      text:    "t".into(),
      html:    "h".into(),
    };

    let dispatched =
      tokio::time::timeout(std::time::Duration::from_secs(5), dispatcher.dispatch(&message))
        .await
        .expect("dispatch must finish")
        .unwrap();

    assert_eq!(dispatched.backend, "log");
    assert!(matches!(dispatched.attempts[0].outcome, AttemptOutcome::Failed { .. }));
  }
}
