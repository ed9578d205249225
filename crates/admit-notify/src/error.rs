//! Error types for `admit-notify`.

use admit_core::notify::SendError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown notification backend: {0:?}")]
  UnknownBackend(String),

  #[error("{0} backend is not configured")]
  NotConfigured(&'static str),

  #[error("invalid email address: {0}")]
  Address(#[from] lettre::address::AddressError),

  #[error("could not build email: {0}")]
  Email(#[from] lettre::error::Error),

  #[error("smtp error: {0}")]
  Smtp(#[from] lettre::transport::smtp::Error),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The provider answered, but not with a success status.
  #[error("provider rejected the message ({status}): {body}")]
  Rejected { status: u16, body: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for SendError {
  fn from(e: Error) -> Self { SendError::new(e.to_string()) }
}
