//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are fixed-width RFC 3339 strings. Metadata is compact JSON.
//! UUIDs are hyphenated lowercase strings. Counts and money are INTEGER.

use admit_core::{
  credential::Credential,
  customer::{Customer, Role},
  event::{Event, TicketCategory},
  order::{Order, OrderStatus, Payment},
};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Nanos, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── Counts ──────────────────────────────────────────────────────────────────

pub fn decode_count(v: i64) -> Result<u32> {
  u32::try_from(v).map_err(|_| Error::Decode(format!("count out of range: {v}")))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str {
  match r {
    Role::Attendee => "attendee",
    Role::Staff => "staff",
  }
}

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "attendee" => Ok(Role::Attendee),
    "staff" => Ok(Role::Staff),
    other => Err(Error::Decode(format!("unknown role: {other:?}"))),
  }
}

pub fn encode_status(s: OrderStatus) -> &'static str {
  match s {
    OrderStatus::Completed => "completed",
  }
}

pub fn decode_status(s: &str) -> Result<OrderStatus> {
  match s {
    "completed" => Ok(OrderStatus::Completed),
    other => Err(Error::Decode(format!("unknown order status: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from an `events` row.
pub struct RawEvent {
  pub event_id:   String,
  pub name:       String,
  pub venue:      Option<String>,
  pub starts_at:  String,
  pub created_at: String,
}

pub const EVENT_COLUMNS: &str = "event_id, name, venue, starts_at, created_at";

impl RawEvent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event_id:   row.get(0)?,
      name:       row.get(1)?,
      venue:      row.get(2)?,
      starts_at:  row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      event_id:   decode_uuid(&self.event_id)?,
      name:       self.name,
      venue:      self.venue,
      starts_at:  decode_dt(&self.starts_at)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `ticket_categories` row.
pub struct RawCategory {
  pub category_id: String,
  pub event_id:    String,
  pub name:        String,
  pub unit_price:  i64,
  pub currency:    String,
  pub total:       i64,
  pub sold:        i64,
  pub sales_start: Option<String>,
  pub sales_end:   Option<String>,
}

pub const CATEGORY_COLUMNS: &str =
  "category_id, event_id, name, unit_price, currency, total, sold, sales_start, sales_end";

impl RawCategory {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      category_id: row.get(0)?,
      event_id:    row.get(1)?,
      name:        row.get(2)?,
      unit_price:  row.get(3)?,
      currency:    row.get(4)?,
      total:       row.get(5)?,
      sold:        row.get(6)?,
      sales_start: row.get(7)?,
      sales_end:   row.get(8)?,
    })
  }

  pub fn into_category(self) -> Result<TicketCategory> {
    Ok(TicketCategory {
      category_id: decode_uuid(&self.category_id)?,
      event_id:    decode_uuid(&self.event_id)?,
      name:        self.name,
      unit_price:  self.unit_price,
      currency:    self.currency,
      total:       decode_count(self.total)?,
      sold:        decode_count(self.sold)?,
      sales_start: decode_opt_dt(self.sales_start)?,
      sales_end:   decode_opt_dt(self.sales_end)?,
    })
  }
}

/// Raw values read directly from a `customers` row.
pub struct RawCustomer {
  pub customer_id: String,
  pub email:       String,
  pub name:        String,
  pub phone:       Option<String>,
  pub company:     Option<String>,
  pub job_title:   Option<String>,
  pub role:        String,
  pub created_at:  String,
  pub updated_at:  String,
}

pub const CUSTOMER_COLUMNS: &str =
  "customer_id, email, name, phone, company, job_title, role, created_at, updated_at";

impl RawCustomer {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      customer_id: row.get(0)?,
      email:       row.get(1)?,
      name:        row.get(2)?,
      phone:       row.get(3)?,
      company:     row.get(4)?,
      job_title:   row.get(5)?,
      role:        row.get(6)?,
      created_at:  row.get(7)?,
      updated_at:  row.get(8)?,
    })
  }

  pub fn into_customer(self) -> Result<Customer> {
    Ok(Customer {
      customer_id: decode_uuid(&self.customer_id)?,
      email:       self.email,
      name:        self.name,
      phone:       self.phone,
      company:     self.company,
      job_title:   self.job_title,
      role:        decode_role(&self.role)?,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from an `orders` row.
pub struct RawOrder {
  pub order_id:          String,
  pub customer_id:       String,
  pub event_id:          String,
  pub category_id:       String,
  pub quantity:          i64,
  pub unit_price:        i64,
  pub total_amount:      i64,
  pub currency:          String,
  pub status:            String,
  pub payment_method:    String,
  pub payment_reference: String,
  pub metadata:          String,
  pub created_at:        String,
}

pub const ORDER_COLUMNS: &str = "order_id, customer_id, event_id, category_id, quantity, \
   unit_price, total_amount, currency, status, payment_method, payment_reference, metadata, \
   created_at";

impl RawOrder {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      order_id:          row.get(0)?,
      customer_id:       row.get(1)?,
      event_id:          row.get(2)?,
      category_id:       row.get(3)?,
      quantity:          row.get(4)?,
      unit_price:        row.get(5)?,
      total_amount:      row.get(6)?,
      currency:          row.get(7)?,
      status:            row.get(8)?,
      payment_method:    row.get(9)?,
      payment_reference: row.get(10)?,
      metadata:          row.get(11)?,
      created_at:        row.get(12)?,
    })
  }

  pub fn into_order(self) -> Result<Order> {
    Ok(Order {
      order_id:     decode_uuid(&self.order_id)?,
      customer_id:  decode_uuid(&self.customer_id)?,
      event_id:     decode_uuid(&self.event_id)?,
      category_id:  decode_uuid(&self.category_id)?,
      quantity:     decode_count(self.quantity)?,
      unit_price:   self.unit_price,
      total_amount: self.total_amount,
      currency:     self.currency,
      status:       decode_status(&self.status)?,
      payment:      Payment {
        method:    self.payment_method,
        reference: self.payment_reference,
      },
      metadata:     serde_json::from_str(&self.metadata)?,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `credentials` row.
pub struct RawCredential {
  pub order_id:  String,
  pub sequence:  i64,
  pub token:     String,
  pub issued_at: String,
}

impl RawCredential {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      order_id:  row.get(0)?,
      sequence:  row.get(1)?,
      token:     row.get(2)?,
      issued_at: row.get(3)?,
    })
  }

  pub fn into_credential(self) -> Result<Credential> {
    Ok(Credential {
      order_id:  decode_uuid(&self.order_id)?,
      sequence:  decode_count(self.sequence)?,
      token:     self.token,
      issued_at: decode_dt(&self.issued_at)?,
    })
  }
}
