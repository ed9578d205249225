//! Handler for `POST /purchase`.
//!
//! Body:
//!
//! ```json
//! {
//!   "ticket_category_id": "…",
//!   "quantity": 2,
//!   "customer": { "name": "…", "email": "…", "phone": "…", "company": "…", "job_title": "…" },
//!   "payment":  { "method": "card", "payment_intent_id": "pi_…" },
//!   "metadata": { }
//! }
//! ```
//!
//! Answers `201` with the order summary, one QR image per ticket and the
//! partial-success flags.

use admit_core::{
  identity::ContactDetails,
  order::{OrderStatus, Payment},
  store::TicketStore,
};
use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  checkout::{PurchaseInput, PurchaseReceipt},
  error::ApiError,
};

// ─── Request ─────────────────────────────────────────────────────────────────

/// Missing fields default so that they surface as validation errors rather
/// than as body-parse rejections.
#[derive(Debug, Default, Deserialize)]
pub struct PurchaseRequest {
  pub ticket_category_id: Option<Uuid>,
  #[serde(default)]
  pub quantity:           i64,
  #[serde(default)]
  pub customer:           ContactDetails,
  #[serde(default)]
  pub payment:            PaymentDetails,
  #[serde(default)]
  pub metadata:           serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentDetails {
  #[serde(default)]
  pub method:            String,
  pub payment_intent_id: Option<String>,
  pub transaction_id:    Option<String>,
}

impl PurchaseRequest {
  pub fn into_input(self) -> Result<PurchaseInput, ApiError> {
    let category_id = self
      .ticket_category_id
      .ok_or_else(|| ApiError::Validation("ticket_category_id is required".into()))?;
    let quantity = u32::try_from(self.quantity)
      .ok()
      .filter(|q| *q >= 1)
      .ok_or_else(|| ApiError::Validation("quantity must be a positive integer".into()))?;
    let reference = self
      .payment
      .payment_intent_id
      .or(self.payment.transaction_id)
      .unwrap_or_default();

    Ok(PurchaseInput {
      category_id,
      quantity,
      contact: self.customer,
      payment: Payment { method: self.payment.method.trim().to_owned(), reference },
      metadata: self.metadata,
    })
  }
}

// ─── Response ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
  pub order:               OrderSummary,
  pub credentials:         Vec<CredentialImage>,
  pub notification_sent:   bool,
  pub credentials_pending: bool,
}

#[derive(Debug, Serialize)]
pub struct OrderSummary {
  pub id:              Uuid,
  pub quantity:        u32,
  pub total_amount:    i64,
  pub currency:        String,
  pub status:          OrderStatus,
  pub customer_email:  String,
  pub event:           EventSummary,
  pub ticket_category: CategorySummary,
}

#[derive(Debug, Serialize)]
pub struct EventSummary {
  pub id:        Uuid,
  pub name:      String,
  pub venue:     Option<String>,
  pub starts_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CategorySummary {
  pub id:         Uuid,
  pub name:       String,
  pub unit_price: i64,
}

#[derive(Debug, Serialize)]
pub struct CredentialImage {
  pub sequence_number:   u32,
  pub qr_image_data_url: String,
}

impl From<PurchaseReceipt> for PurchaseResponse {
  fn from(r: PurchaseReceipt) -> Self {
    Self {
      order:               OrderSummary {
        id:              r.order.order_id,
        quantity:        r.order.quantity,
        total_amount:    r.order.total_amount,
        currency:        r.order.currency,
        status:          r.order.status,
        customer_email:  r.customer.email,
        event:           EventSummary {
          id:        r.event.event_id,
          name:      r.event.name,
          venue:     r.event.venue,
          starts_at: r.event.starts_at,
        },
        ticket_category: CategorySummary {
          id:         r.category.category_id,
          name:       r.category.name,
          unit_price: r.order.unit_price,
        },
      },
      credentials:         r
        .credentials
        .into_iter()
        .map(|i| CredentialImage {
          sequence_number:   i.credential.sequence,
          qr_image_data_url: i.rendering.png_data_url,
        })
        .collect(),
      notification_sent:   r.notification_sent,
      credentials_pending: r.credentials_pending,
    }
  }
}

// ─── Handler ─────────────────────────────────────────────────────────────────

/// `POST /purchase`
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  body: Result<Json<PurchaseRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TicketStore + 'static,
{
  let Json(body) = body?;
  let receipt = state.checkout.purchase(body.into_input()?).await?;
  Ok((StatusCode::CREATED, Json(PurchaseResponse::from(receipt))))
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn parse(v: serde_json::Value) -> Result<PurchaseInput, ApiError> {
    serde_json::from_value::<PurchaseRequest>(v).unwrap().into_input()
  }

  #[test]
  fn payment_reference_prefers_intent_id() {
    let input = parse(json!({
      "ticket_category_id": Uuid::nil(),
      "quantity": 2,
      "payment": { "method": "card", "payment_intent_id": "pi_1", "transaction_id": "tx_1" },
    }))
    .unwrap();
    assert_eq!(input.quantity, 2);
    assert_eq!(input.payment.reference, "pi_1");
  }

  #[test]
  fn transaction_id_is_accepted() {
    let input = parse(json!({
      "ticket_category_id": Uuid::nil(),
      "quantity": 1,
      "payment": { "method": "bank", "transaction_id": "tx_1" },
    }))
    .unwrap();
    assert_eq!(input.payment.reference, "tx_1");
  }

  #[test]
  fn non_positive_quantity_is_invalid() {
    for q in [0, -1] {
      let err = parse(json!({ "ticket_category_id": Uuid::nil(), "quantity": q })).unwrap_err();
      assert!(matches!(err, ApiError::Validation(_)), "quantity {q}");
    }
  }

  #[test]
  fn missing_category_is_invalid() {
    assert!(matches!(parse(json!({ "quantity": 1 })), Err(ApiError::Validation(_))));
  }
}
