//! Handlers for `/admin/orders`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/admin/orders` | Optional `?event_id=<uuid>`, newest first |
//! | `GET`  | `/admin/orders/{id}` | Order, customer and rendered credentials |
//! | `POST` | `/admin/orders/{id}/credentials` | Issue missing credentials and email them; idempotent |

use admit_core::{customer::Customer, order::Order, store::TicketStore};
use admit_credential::IssuedCredential;
use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  checkout::render_all,
  error::{ApiError, from_store},
};

/// A stored credential with its renderings.
#[derive(Debug, Serialize)]
pub struct CredentialDetail {
  pub sequence_number:   u32,
  pub token:             String,
  pub issued_at:         DateTime<Utc>,
  pub qr_image_data_url: String,
  pub qr_svg:            String,
}

impl From<IssuedCredential> for CredentialDetail {
  fn from(i: IssuedCredential) -> Self {
    Self {
      sequence_number:   i.credential.sequence,
      token:             i.credential.token,
      issued_at:         i.credential.issued_at,
      qr_image_data_url: i.rendering.png_data_url,
      qr_svg:            i.rendering.svg,
    }
  }
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub event_id: Option<Uuid>,
}

/// `GET /admin/orders[?event_id=<uuid>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Order>>, ApiError>
where
  S: TicketStore + 'static,
{
  let orders = state.store.list_orders(params.event_id).await.map_err(from_store)?;
  Ok(Json(orders))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct OrderDetail {
  pub order:       Order,
  pub customer:    Option<Customer>,
  pub credentials: Vec<CredentialDetail>,
}

/// `GET /admin/orders/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<OrderDetail>, ApiError>
where
  S: TicketStore + 'static,
{
  let order = state
    .store
    .get_order(id)
    .await
    .map_err(from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("order {id} not found")))?;
  let customer = state.store.get_customer(order.customer_id).await.map_err(from_store)?;
  let credentials = state.store.get_credentials(id).await.map_err(from_store)?;

  Ok(Json(OrderDetail {
    order,
    customer,
    credentials: render_all(credentials)?.into_iter().map(CredentialDetail::from).collect(),
  }))
}

// ─── Re-issue ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Reissued {
  pub order_id:          Uuid,
  pub credentials:       Vec<CredentialDetail>,
  pub notification_sent: bool,
}

/// `POST /admin/orders/{id}/credentials`
pub async fn reissue<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Reissued>, ApiError>
where
  S: TicketStore + 'static,
{
  let reissue = state.checkout.reissue(id).await?;
  Ok(Json(Reissued {
    order_id:          id,
    credentials:       reissue.credentials.into_iter().map(CredentialDetail::from).collect(),
    notification_sent: reissue.notification_sent,
  }))
}
