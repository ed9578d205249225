//! Credentials: one verifiable access token per purchased unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The claims embedded in a credential token.
///
/// Field order is the serialization order and must stay stable: the same
/// claims always encode to the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPayload {
  pub order_id:    Uuid,
  pub customer_id: Uuid,
  pub category_id: Uuid,
  pub event_id:    Uuid,
  pub sequence:    u32,
  pub issued_at:   DateTime<Utc>,
}

/// A persisted credential. Owned by its order; never deleted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
  pub order_id:  Uuid,
  /// 1-based, contiguous and unique within the order.
  pub sequence:  u32,
  /// Signed, encoded [`CredentialPayload`].
  pub token:     String,
  pub issued_at: DateTime<Utc>,
}
