//! Handler for `POST /credentials/verify`.
//!
//! Checks a scanned token's signature and reports what it admits. A token
//! that verifies but is not on record (e.g. from before a re-issue) is still
//! returned, with `recorded: false`.

use admit_core::{credential::CredentialPayload, store::TicketStore};
use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};

use crate::{
  AppState,
  error::{ApiError, from_store},
};

#[derive(Debug, Deserialize)]
pub struct VerifyBody {
  pub token: String,
}

#[derive(Debug, Serialize)]
pub struct Verified {
  pub valid:    bool,
  pub recorded: bool,
  pub payload:  CredentialPayload,
}

/// `POST /credentials/verify`, body: `{"token":"…"}`
pub async fn verify<S>(
  State(state): State<AppState<S>>,
  body: Result<Json<VerifyBody>, JsonRejection>,
) -> Result<Json<Verified>, ApiError>
where
  S: TicketStore + 'static,
{
  let Json(body) = body?;
  let payload = state.checkout.issuer().verify(&body.token)?;
  let token = body.token.trim();
  let recorded = state
    .store
    .get_credentials(payload.order_id)
    .await
    .map_err(from_store)?
    .iter()
    .any(|c| c.sequence == payload.sequence && c.token == token);

  Ok(Json(Verified { valid: true, recorded, payload }))
}
