//! Ticket category handlers.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/categories/{id}/availability` | Public |
//! | `GET`  | `/admin/events/{id}/categories` | 404 if the event is unknown |
//! | `POST` | `/admin/events/{id}/categories` | Body: name, unit_price, currency, total, sales window |
//! | `PUT`  | `/admin/categories/{id}/price` | Body: `{"unit_price": 4900}` |

use admit_core::{
  event::{NewTicketCategory, TicketCategory},
  inventory::on_sale,
  store::TicketStore,
};
use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  error::{ApiError, from_store},
};

// ─── Availability ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Availability {
  pub category_id: Uuid,
  pub total:       u32,
  pub sold:        u32,
  pub available:   u32,
  pub on_sale:     bool,
}

/// `GET /categories/{id}/availability`
pub async fn availability<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Availability>, ApiError>
where
  S: TicketStore + 'static,
{
  let category = state
    .store
    .get_category(id)
    .await
    .map_err(from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("ticket category {id} not found")))?;

  Ok(Json(Availability {
    category_id: category.category_id,
    total:       category.total,
    sold:        category.sold,
    available:   category.available(),
    on_sale:     on_sale(&category, Utc::now()),
  }))
}

// ─── Admin ───────────────────────────────────────────────────────────────────

/// `GET /admin/events/{id}/categories`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Path(event_id): Path<Uuid>,
) -> Result<Json<Vec<TicketCategory>>, ApiError>
where
  S: TicketStore + 'static,
{
  if state.store.get_event(event_id).await.map_err(from_store)?.is_none() {
    return Err(ApiError::NotFound(format!("event {event_id} not found")));
  }
  let categories = state.store.list_categories(event_id).await.map_err(from_store)?;
  Ok(Json(categories))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:        String,
  pub unit_price:  i64,
  pub currency:    String,
  pub total:       u32,
  #[serde(default)]
  pub sales_start: Option<DateTime<Utc>>,
  #[serde(default)]
  pub sales_end:   Option<DateTime<Utc>>,
}

/// `POST /admin/events/{id}/categories`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Path(event_id): Path<Uuid>,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TicketStore + 'static,
{
  let Json(body) = body?;
  let category = state
    .store
    .create_category(NewTicketCategory {
      event_id,
      name: body.name,
      unit_price: body.unit_price,
      currency: body.currency,
      total: body.total,
      sales_start: body.sales_start,
      sales_end: body.sales_end,
    })
    .await
    .map_err(from_store)?;
  tracing::info!(
    category_id = %category.category_id,
    %event_id,
    total = category.total,
    "ticket category created"
  );
  Ok((StatusCode::CREATED, Json(category)))
}

#[derive(Debug, Deserialize)]
pub struct PriceBody {
  pub unit_price: i64,
}

/// `PUT /admin/categories/{id}/price`
///
/// Orders already placed keep the price they were sold at.
pub async fn update_price<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  body: Result<Json<PriceBody>, JsonRejection>,
) -> Result<Json<TicketCategory>, ApiError>
where
  S: TicketStore + 'static,
{
  let Json(body) = body?;
  let category = state
    .store
    .update_category_price(id, body.unit_price)
    .await
    .map_err(from_store)?;
  tracing::info!(category_id = %id, unit_price = body.unit_price, "price changed");
  Ok(Json(category))
}
