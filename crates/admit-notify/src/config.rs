//! Notification settings, deserialized from the server's config file.

use std::time::Duration;

use serde::Deserialize;

pub const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";
pub const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

/// Which backends to try, in which order, and how to reach each of them.
///
/// A backend named in `order` whose section is missing or incomplete is still
/// part of the chain; it simply reports itself as not configured.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
  #[serde(default = "default_order")]
  pub order:           Vec<String>,
  #[serde(default = "default_from_email")]
  pub from_email:      String,
  #[serde(default)]
  pub from_name:       Option<String>,
  #[serde(default)]
  pub resend:          ResendConfig,
  #[serde(default)]
  pub sendgrid:        SendGridConfig,
  #[serde(default)]
  pub smtp:            SmtpConfig,
  /// Upper bound on one backend's delivery attempt, in milliseconds.
  #[serde(default = "default_send_timeout_ms")]
  pub send_timeout_ms: u64,
}

impl NotificationConfig {
  pub fn send_timeout(&self) -> Duration { Duration::from_millis(self.send_timeout_ms) }
}

impl Default for NotificationConfig {
  fn default() -> Self {
    Self {
      order:           default_order(),
      from_email:      default_from_email(),
      from_name:       None,
      resend:          ResendConfig::default(),
      sendgrid:        SendGridConfig::default(),
      smtp:            SmtpConfig::default(),
      send_timeout_ms: default_send_timeout_ms(),
    }
  }
}

fn default_order() -> Vec<String> {
  vec!["resend".into(), "sendgrid".into(), "smtp".into()]
}

fn default_from_email() -> String { "tickets@localhost".into() }

fn default_send_timeout_ms() -> u64 { 10_000 }

#[derive(Debug, Clone, Deserialize)]
pub struct ResendConfig {
  #[serde(default)]
  pub api_key:  String,
  #[serde(default = "default_resend_endpoint")]
  pub endpoint: String,
}

impl Default for ResendConfig {
  fn default() -> Self { Self { api_key: String::new(), endpoint: default_resend_endpoint() } }
}

fn default_resend_endpoint() -> String { RESEND_ENDPOINT.into() }

#[derive(Debug, Clone, Deserialize)]
pub struct SendGridConfig {
  #[serde(default)]
  pub api_key:  String,
  #[serde(default = "default_sendgrid_endpoint")]
  pub endpoint: String,
}

impl Default for SendGridConfig {
  fn default() -> Self { Self { api_key: String::new(), endpoint: default_sendgrid_endpoint() } }
}

fn default_sendgrid_endpoint() -> String { SENDGRID_ENDPOINT.into() }

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
  #[serde(default)]
  pub host:     String,
  #[serde(default)]
  pub port:     Option<u16>,
  #[serde(default)]
  pub username: Option<String>,
  #[serde(default)]
  pub password: Option<String>,
  /// Upgrade with STARTTLS. Turn off only for local test relays.
  #[serde(default = "default_starttls")]
  pub starttls: bool,
}

impl Default for SmtpConfig {
  fn default() -> Self {
    Self { host: String::new(), port: None, username: None, password: None, starttls: true }
  }
}

fn default_starttls() -> bool { true }
