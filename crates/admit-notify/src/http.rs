//! Transactional-email HTTP APIs: Resend and SendGrid.

use admit_core::notify::{Delivery, Message, NotificationBackend, SendError, SendFuture};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  Error, Result, Sender,
  config::{ResendConfig, SendGridConfig},
};

/// Turn a non-2xx response into [`Error::Rejected`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }
  let body = response.text().await.unwrap_or_default();
  Err(Error::Rejected { status: status.as_u16(), body })
}

// ─── Resend ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ResendBackend {
  client:   reqwest::Client,
  api_key:  String,
  endpoint: String,
  from:     Sender,
}

#[derive(Deserialize)]
struct ResendAccepted {
  id: Option<String>,
}

impl ResendBackend {
  pub fn new(client: reqwest::Client, config: &ResendConfig, from: Sender) -> Self {
    Self {
      client,
      api_key: config.api_key.trim().to_owned(),
      endpoint: config.endpoint.clone(),
      from,
    }
  }

  pub fn request_body(&self, message: &Message) -> Value {
    json!({
      "from":    self.from.to_string(),
      "to":      [message.to],
      "subject": message.subject,
      "text":    message.text,
      "html":    message.html,
    })
  }

  async fn deliver(&self, message: &Message) -> Result<Delivery> {
    let response = self
      .client
      .post(&self.endpoint)
      .bearer_auth(&self.api_key)
      .json(&self.request_body(message))
      .send()
      .await?;
    let accepted: ResendAccepted = check_status(response).await?.json().await?;
    Ok(Delivery { message_id: accepted.id })
  }
}

impl NotificationBackend for ResendBackend {
  fn name(&self) -> &str { "resend" }

  fn is_configured(&self) -> bool { !self.api_key.is_empty() }

  fn send<'a>(&'a self, message: &'a Message) -> SendFuture<'a> {
    Box::pin(async move { self.deliver(message).await.map_err(SendError::from) })
  }
}

// ─── SendGrid ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SendGridBackend {
  client:   reqwest::Client,
  api_key:  String,
  endpoint: String,
  from:     Sender,
}

impl SendGridBackend {
  pub fn new(client: reqwest::Client, config: &SendGridConfig, from: Sender) -> Self {
    Self {
      client,
      api_key: config.api_key.trim().to_owned(),
      endpoint: config.endpoint.clone(),
      from,
    }
  }

  pub fn request_body(&self, message: &Message) -> Value {
    let mut to = json!({ "email": message.to });
    if let Some(name) = &message.to_name {
      to["name"] = json!(name);
    }
    let mut from = json!({ "email": self.from.email });
    if let Some(name) = &self.from.name {
      from["name"] = json!(name);
    }

    json!({
      "personalizations": [{ "to": [to] }],
      "from":    from,
      "subject": message.subject,
      "content": [
        { "type": "text/plain", "value": message.text },
        { "type": "text/html",  "value": message.html },
      ],
    })
  }

  async fn deliver(&self, message: &Message) -> Result<Delivery> {
    let response = self
      .client
      .post(&self.endpoint)
      .bearer_auth(&self.api_key)
      .json(&self.request_body(message))
      .send()
      .await?;
    let response = check_status(response).await?;

    // SendGrid answers 202 with an empty body; the id lives in a header.
    let message_id = response
      .headers()
      .get("x-message-id")
      .and_then(|v| v.to_str().ok())
      .map(str::to_owned);
    Ok(Delivery { message_id })
  }
}

impl NotificationBackend for SendGridBackend {
  fn name(&self) -> &str { "sendgrid" }

  fn is_configured(&self) -> bool { !self.api_key.is_empty() }

  fn send<'a>(&'a self, message: &'a Message) -> SendFuture<'a> {
    Box::pin(async move { self.deliver(message).await.map_err(SendError::from) })
  }
}

#[cfg(test)]
mod tests {
  use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    routing::post,
  };

  use super::*;

  fn message() -> Message {
    Message {
      to:      "alice@example.com".into(),
      to_name: Some("Alice".into()),
      subject: "Your tickets".into(),
      text:    "plain".into(),
      html:    "<p>html</p>".into(),
    }
  }

  fn sender() -> Sender { Sender { email: "tickets@example.com".into(), name: Some("Box Office".into()) } }

  /// Serve one POST route at `/` that demands `Bearer key` and answers with
  /// `status` and `body`. Returns the base URL.
  async fn mock(status: StatusCode, body: Value) -> String {
    let app = Router::new().route(
      "/",
      post(move |headers: HeaderMap| {
        let body = body.clone();
        async move {
          let auth = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
          if auth != Some("Bearer key") {
            return (StatusCode::UNAUTHORIZED, [("x-message-id", "")], Json(json!({})));
          }
          (status, [("x-message-id", "sg_1")], Json(body))
        }
      }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}/")
  }

  fn resend(endpoint: String, api_key: &str) -> ResendBackend {
    ResendBackend::new(
      reqwest::Client::new(),
      &ResendConfig { api_key: api_key.into(), endpoint },
      sender(),
    )
  }

  fn sendgrid(endpoint: String, api_key: &str) -> SendGridBackend {
    SendGridBackend::new(
      reqwest::Client::new(),
      &SendGridConfig { api_key: api_key.into(), endpoint },
      sender(),
    )
  }

  #[test]
  fn resend_body_shape() {
    let body = resend(String::new(), "key").request_body(&message());
    assert_eq!(body["from"], "Box Office <tickets@example.com>");
    assert_eq!(body["to"], json!(["alice@example.com"]));
    assert_eq!(body["subject"], "Your tickets");
    assert_eq!(body["html"], "<p>html</p>");
  }

  #[test]
  fn sendgrid_body_shape() {
    let body = sendgrid(String::new(), "key").request_body(&message());
    assert_eq!(
      body["personalizations"][0]["to"][0],
      json!({ "email": "alice@example.com", "name": "Alice" })
    );
    assert_eq!(body["from"]["email"], "tickets@example.com");
    assert_eq!(body["content"][0]["type"], "text/plain");
    assert_eq!(body["content"][1]["value"], "<p>html</p>");
  }

  #[test]
  fn blank_api_key_is_not_configured() {
    assert!(!resend(String::new(), "  ").is_configured());
    assert!(!sendgrid(String::new(), "").is_configured());
    assert!(resend(String::new(), "key").is_configured());
  }

  #[tokio::test]
  async fn resend_returns_provider_id() {
    let url = mock(StatusCode::OK, json!({ "id": "re_123" })).await;
    let delivery = resend(url, "key").send(&message()).await.unwrap();
    assert_eq!(delivery.message_id.as_deref(), Some("re_123"));
  }

  #[tokio::test]
  async fn resend_rejection_is_a_send_error() {
    let url = mock(StatusCode::OK, json!({ "id": "re_123" })).await;
    let err = resend(url, "wrong").send(&message()).await.unwrap_err();
    assert!(err.0.contains("401"), "{err}");
  }

  #[tokio::test]
  async fn sendgrid_reads_message_id_header() {
    let url = mock(StatusCode::ACCEPTED, json!({})).await;
    let delivery = sendgrid(url, "key").send(&message()).await.unwrap();
    assert_eq!(delivery.message_id.as_deref(), Some("sg_1"));
  }

  #[tokio::test]
  async fn sendgrid_server_error_is_a_send_error() {
    let url = mock(StatusCode::INTERNAL_SERVER_ERROR, json!({ "errors": [] })).await;
    let err = sendgrid(url, "key").send(&message()).await.unwrap_err();
    assert!(err.0.contains("500"), "{err}");
  }
}
