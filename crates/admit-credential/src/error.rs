//! Error types for the admit-credential codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("credential secret must not be empty")]
  EmptySecret,

  #[error("invalid signing key")]
  InvalidKey,

  #[error("malformed credential token: {0}")]
  Malformed(String),

  #[error("credential signature does not match")]
  BadSignature,

  #[error("cannot render credential: {0}")]
  Render(String),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
