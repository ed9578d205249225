//! Handlers for `/admin/events`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/admin/events` | Ordered by start time |
//! | `POST` | `/admin/events` | Body: `{"name":"…","venue":"…","starts_at":"…"}` |

use admit_core::{
  event::{Event, NewEvent},
  store::TicketStore,
};
use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};

use crate::{
  AppState,
  error::{ApiError, from_store},
};

/// `GET /admin/events`
pub async fn list<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<Event>>, ApiError>
where
  S: TicketStore + 'static,
{
  let events = state.store.list_events().await.map_err(from_store)?;
  Ok(Json(events))
}

/// `POST /admin/events`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  body: Result<Json<NewEvent>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TicketStore + 'static,
{
  let Json(body) = body?;
  let event = state.store.create_event(body).await.map_err(from_store)?;
  tracing::info!(event_id = %event.event_id, name = %event.name, "event created");
  Ok((StatusCode::CREATED, Json(event)))
}
