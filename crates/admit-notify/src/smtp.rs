//! Direct SMTP delivery through `lettre`.

use admit_core::notify::{Delivery, Message, NotificationBackend, SendError, SendFuture};
use lettre::{
  AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
  message::{Mailbox, MultiPart},
  transport::smtp::authentication::Credentials,
};
use std::time::Duration;

use uuid::Uuid;

use crate::{Error, Result, Sender, config::SmtpConfig};

pub struct SmtpBackend {
  /// `None` when no relay host is configured.
  transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
  from:      Sender,
  domain:    String,
}

impl SmtpBackend {
  /// Prepare the transport. No connection is opened until the first send.
  pub fn new(config: &SmtpConfig, from: Sender, timeout: Duration) -> Result<Self> {
    let host = config.host.trim();
    let transport = if host.is_empty() {
      None
    } else {
      let mut builder = if config.starttls {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
      } else {
        AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
      };
      builder = builder.timeout(Some(timeout));
      if let Some(port) = config.port {
        builder = builder.port(port);
      }
      if let (Some(user), Some(pass)) = (&config.username, &config.password) {
        builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
      }
      Some(builder.build())
    };

    let domain = from
      .email
      .rsplit_once('@')
      .map_or("localhost", |(_, d)| d)
      .to_owned();

    Ok(Self { transport, from, domain })
  }

  fn build(&self, message: &Message, message_id: &str) -> Result<lettre::Message> {
    let from = Mailbox::new(self.from.name.clone(), self.from.email.parse()?);
    let to = Mailbox::new(message.to_name.clone(), message.to.parse()?);

    Ok(
      lettre::Message::builder()
        .from(from)
        .to(to)
        .subject(&message.subject)
        .message_id(Some(message_id.to_owned()))
        .multipart(MultiPart::alternative_plain_html(
          message.text.clone(),
          message.html.clone(),
        ))?,
    )
  }

  async fn deliver(&self, message: &Message) -> Result<Delivery> {
    let transport = self.transport.as_ref().ok_or(Error::NotConfigured("smtp"))?;
    let message_id = format!("<{}@{}>", Uuid::new_v4(), self.domain);
    let email = self.build(message, &message_id)?;

    transport.send(email).await?;
    Ok(Delivery { message_id: Some(message_id) })
  }
}

impl NotificationBackend for SmtpBackend {
  fn name(&self) -> &str { "smtp" }

  fn is_configured(&self) -> bool { self.transport.is_some() }

  fn send<'a>(&'a self, message: &'a Message) -> SendFuture<'a> {
    Box::pin(async move { self.deliver(message).await.map_err(SendError::from) })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const TIMEOUT: Duration = Duration::from_secs(1);

  fn sender() -> Sender { Sender { email: "tickets@example.com".into(), name: None } }

  fn message(to: &str) -> Message {
    Message {
      to:      to.into(),
      to_name: None,
      subject: "Hi".into(),
      text:    "plain".into(),
      html:    "<p>html</p>".into(),
    }
  }

  #[test]
  fn without_host_is_not_configured() {
    let backend = SmtpBackend::new(&SmtpConfig::default(), sender(), TIMEOUT).unwrap();
    assert!(!backend.is_configured());
  }

  #[test]
  fn with_host_is_configured() {
    let config = SmtpConfig { host: "localhost".into(), starttls: false, ..SmtpConfig::default() };
    let backend = SmtpBackend::new(&config, sender(), TIMEOUT).unwrap();
    assert!(backend.is_configured());
    assert_eq!(backend.domain, "example.com");
  }

  #[test]
  fn bad_recipient_fails_to_build() {
    let backend = SmtpBackend::new(&SmtpConfig::default(), sender(), TIMEOUT).unwrap();
    assert!(backend.build(&message("not an address"), "<id@example.com>").is_err());
    assert!(backend.build(&message("alice@example.com"), "<id@example.com>").is_ok());
  }

  #[tokio::test]
  async fn unconfigured_send_is_an_error() {
    let backend = SmtpBackend::new(&SmtpConfig::default(), sender(), TIMEOUT).unwrap();
    let err = backend.send(&message("alice@example.com")).await.unwrap_err();
    assert!(err.0.contains("not configured"), "{err}");
  }
}
