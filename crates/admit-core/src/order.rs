//! Orders: one per successful purchase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  /// Payment was authorized upstream before the order was recorded.
  Completed,
}

/// How the order was paid for. Opaque to this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
  pub method:    String,
  /// Payment intent or transaction identifier from the payment provider.
  pub reference: String,
}

/// A recorded purchase.
///
/// `unit_price` and `total_amount` are snapshots taken at creation and never
/// recomputed, even if the category's price changes later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
  pub order_id:     Uuid,
  pub customer_id:  Uuid,
  pub event_id:     Uuid,
  pub category_id:  Uuid,
  pub quantity:     u32,
  pub unit_price:   i64,
  pub total_amount: i64,
  pub currency:     String,
  pub status:       OrderStatus,
  pub payment:      Payment,
  pub metadata:     serde_json::Value,
  pub created_at:   DateTime<Utc>,
}

/// Input for [`TicketStore::record_order`](crate::store::TicketStore::record_order).
#[derive(Debug, Clone)]
pub struct NewOrder {
  pub customer_id: Uuid,
  pub event_id:    Uuid,
  pub category_id: Uuid,
  pub quantity:    u32,
  /// Price of one unit as seen by the caller when the purchase started.
  pub unit_price:  i64,
  pub currency:    String,
  pub payment:     Payment,
  pub metadata:    serde_json::Value,
}

impl NewOrder {
  pub fn total_amount(&self) -> Result<i64> {
    if self.quantity == 0 {
      return Err(Error::Validation("quantity must be at least 1".into()));
    }
    self
      .unit_price
      .checked_mul(i64::from(self.quantity))
      .ok_or_else(|| Error::Validation("order total overflows".into()))
  }

  /// Build the persisted [`Order`] with a fresh id and the snapshotted total.
  pub fn into_order(self, created_at: DateTime<Utc>) -> Result<Order> {
    let total_amount = self.total_amount()?;
    Ok(Order {
      order_id: Uuid::new_v4(),
      customer_id: self.customer_id,
      event_id: self.event_id,
      category_id: self.category_id,
      quantity: self.quantity,
      unit_price: self.unit_price,
      total_amount,
      currency: self.currency,
      status: OrderStatus::Completed,
      payment: self.payment,
      metadata: self.metadata,
      created_at,
    })
  }
}
