//! Error type for `admit-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain rejection (unknown category, sold out, …).
  #[error("{0}")]
  Core(#[from] admit_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unexpected column value: {0}")]
  Decode(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for admit_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(core) => core,
      other => admit_core::Error::Persistence(Box::new(other)),
    }
  }
}
