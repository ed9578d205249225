//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error body is `{"error": <message>, "details"?: <string>}`.

use admit_core::Availability;
use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::checkout::CheckoutError;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("invalid request: {0}")]
  Validation(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("tickets unavailable: {0}")]
  Unavailable(Availability),

  #[error("invalid credential: {0}")]
  InvalidCredential(String),

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<admit_core::Error> for ApiError {
  fn from(e: admit_core::Error) -> Self {
    use admit_core::Error as E;
    match e {
      E::Validation(m) => ApiError::Validation(m),
      E::EventNotFound(id) => ApiError::NotFound(format!("event {id} not found")),
      E::CategoryNotFound(id) => ApiError::NotFound(format!("ticket category {id} not found")),
      E::OrderNotFound(id) => ApiError::NotFound(format!("order {id} not found")),
      E::Unavailable(reason) => ApiError::Unavailable(reason),
      other => ApiError::Internal(Box::new(other)),
    }
  }
}

impl From<admit_credential::Error> for ApiError {
  fn from(e: admit_credential::Error) -> Self {
    use admit_credential::Error as E;
    match e {
      e @ (E::Malformed(_) | E::BadSignature) => ApiError::InvalidCredential(e.to_string()),
      other => ApiError::Internal(Box::new(other)),
    }
  }
}

/// A body that is not valid JSON for the handler is a validation failure.
impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { ApiError::Validation(rejection.body_text()) }
}

impl From<CheckoutError> for ApiError {
  fn from(e: CheckoutError) -> Self {
    match e {
      CheckoutError::Rejected(e) => e.into(),
      CheckoutError::Credential(e) => e.into(),
    }
  }
}

/// Classify a store error through the core taxonomy.
pub(crate) fn from_store<E: Into<admit_core::Error>>(e: E) -> ApiError { ApiError::from(e.into()) }

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, error, details) = match &self {
      ApiError::Validation(m) => (StatusCode::BAD_REQUEST, "invalid request", Some(m.clone())),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, "not found", Some(m.clone())),
      ApiError::Unavailable(reason) => {
        (StatusCode::CONFLICT, "tickets unavailable", Some(reason.to_string()))
      }
      ApiError::InvalidCredential(m) => {
        (StatusCode::BAD_REQUEST, "invalid credential", Some(m.clone()))
      }
      ApiError::Internal(e) => {
        tracing::error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error", None)
      }
    };

    let body = match details {
      Some(details) => json!({ "error": error, "details": details }),
      None => json!({ "error": error }),
    };
    (status, Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  fn status(e: impl Into<ApiError>) -> StatusCode { e.into().into_response().status() }

  #[test]
  fn taxonomy_maps_to_status() {
    assert_eq!(status(admit_core::Error::Validation("x".into())), StatusCode::BAD_REQUEST);
    assert_eq!(status(admit_core::Error::CategoryNotFound(Uuid::nil())), StatusCode::NOT_FOUND);
    assert_eq!(
      status(admit_core::Error::Unavailable(Availability::Oversold { requested: 1 })),
      StatusCode::CONFLICT
    );
    assert_eq!(
      status(admit_core::Error::Persistence("disk full".into())),
      StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(status(admit_credential::Error::BadSignature), StatusCode::BAD_REQUEST);
    assert_eq!(
      status(admit_credential::Error::Render("too long".into())),
      StatusCode::INTERNAL_SERVER_ERROR
    );
  }
}
