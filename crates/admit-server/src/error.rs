//! Error types and axum `IntoResponse` implementation.

use axum::{
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,
  #[error("credential issuer: {0}")]
  Credential(#[from] admit_credential::Error),
  #[error("notification backends: {0}")]
  Notify(#[from] admit_notify::Error),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized => {
        let mut res = (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"admit\""),
        );
        res
      }
      Error::Credential(_) | Error::Notify(_) => {
        tracing::error!(error = %self, "server misconfigured");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
      }
    }
  }
}
