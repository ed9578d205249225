//! Events and the ticket categories sold for them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Event ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
  pub event_id:   Uuid,
  pub name:       String,
  pub venue:      Option<String>,
  pub starts_at:  DateTime<Utc>,
  pub created_at: DateTime<Utc>,
}

/// Input for [`TicketStore::create_event`](crate::store::TicketStore::create_event).
#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
  pub name:      String,
  pub venue:     Option<String>,
  pub starts_at: DateTime<Utc>,
}

impl NewEvent {
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::Validation("event name must not be empty".into()));
    }
    Ok(())
  }
}

// ─── Ticket category ─────────────────────────────────────────────────────────

/// A purchasable class of admission with its own price and inventory pool.
///
/// `sold <= total` holds at all times. `sold` only ever moves through the
/// store's atomic increment, never through a read-modify-write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketCategory {
  pub category_id: Uuid,
  pub event_id:    Uuid,
  pub name:        String,
  /// Price of one unit in minor currency units (e.g. cents).
  pub unit_price:  i64,
  /// Upper-case ISO 4217 code.
  pub currency:    String,
  pub total:       u32,
  pub sold:        u32,
  pub sales_start: Option<DateTime<Utc>>,
  pub sales_end:   Option<DateTime<Utc>>,
}

impl TicketCategory {
  pub fn available(&self) -> u32 { self.total.saturating_sub(self.sold) }
}

/// Input for [`TicketStore::create_category`](crate::store::TicketStore::create_category).
#[derive(Debug, Clone, Deserialize)]
pub struct NewTicketCategory {
  pub event_id:    Uuid,
  pub name:        String,
  pub unit_price:  i64,
  pub currency:    String,
  pub total:       u32,
  #[serde(default)]
  pub sales_start: Option<DateTime<Utc>>,
  #[serde(default)]
  pub sales_end:   Option<DateTime<Utc>>,
}

impl NewTicketCategory {
  /// Check field constraints and upper-case the currency code in place.
  pub fn normalize(&mut self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::Validation("category name must not be empty".into()));
    }
    if self.unit_price < 0 {
      return Err(Error::Validation("unit_price must not be negative".into()));
    }
    self.currency = normalize_currency(&self.currency)?;
    if let (Some(start), Some(end)) = (self.sales_start, self.sales_end)
      && end < start
    {
      return Err(Error::Validation("sales_end is before sales_start".into()));
    }
    Ok(())
  }
}

/// Upper-case a three-letter currency code, rejecting anything else.
pub fn normalize_currency(code: &str) -> Result<String> {
  let code = code.trim();
  if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
    return Err(Error::Validation(format!(
      "currency must be a three-letter code, got {code:?}"
    )));
  }
  Ok(code.to_ascii_uppercase())
}
