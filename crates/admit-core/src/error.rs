//! Error types for `admit-core`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Why a ticket category cannot satisfy a purchase right now.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Availability {
  #[error("only {available} ticket(s) left, {requested} requested")]
  OutOfStock { requested: u32, available: u32 },

  #[error("sales open at {starts_at}")]
  SalesNotStarted { starts_at: DateTime<Utc> },

  #[error("sales closed at {ended_at}")]
  SalesEnded { ended_at: DateTime<Utc> },

  /// The atomic increment at write time found `sold + qty > total`.
  #[error("sold out while the order was being placed")]
  Oversold { requested: u32 },
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid request: {0}")]
  Validation(String),

  #[error("event not found: {0}")]
  EventNotFound(Uuid),

  #[error("ticket category not found: {0}")]
  CategoryNotFound(Uuid),

  #[error("order not found: {0}")]
  OrderNotFound(Uuid),

  #[error("tickets unavailable: {0}")]
  Unavailable(#[from] Availability),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// The record store was unreachable or rejected a write.
  #[error("persistence error: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
