//! HTTP server assembly for Admit.
//!
//! Combines the public and admin routers from `admit-api` under `/api`,
//! guards the admin routes with HTTP Basic auth, and builds the shared
//! application state from a [`ServerConfig`].

pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use admit_api::{AppState, LiveFeed, live::DEFAULT_CAPACITY};
use admit_core::{notify::Dispatcher, store::TicketStore};
use admit_credential::CredentialIssuer;
use admit_notify::NotificationConfig;
use axum::{Router, middleware};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, require_auth};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `ADMIT__*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  /// HMAC key for credential tokens. Changing it invalidates issued tickets.
  pub credential_secret:   String,
  pub admin_username:      String,
  pub admin_password_hash: String,
  #[serde(default = "default_capacity")]
  pub live_feed_capacity:  usize,
  #[serde(default)]
  pub notifications:       NotificationConfig,
}

fn default_capacity() -> usize { DEFAULT_CAPACITY }

impl ServerConfig {
  pub fn auth(&self) -> AuthConfig {
    AuthConfig {
      username:      self.admin_username.clone(),
      password_hash: self.admin_password_hash.clone(),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Build the handler state: credential issuer, notification chain and live
/// feed, all derived from `config`.
pub fn app_state<S>(store: Arc<S>, config: &ServerConfig) -> Result<AppState<S>, Error>
where
  S: TicketStore + 'static,
{
  let issuer = CredentialIssuer::new(&config.credential_secret)?;
  let dispatcher = Dispatcher::new(admit_notify::build_chain(&config.notifications)?)
    .with_timeout(config.notifications.send_timeout());
  tracing::info!(backends = ?dispatcher.backend_names(), "notification chain ready");

  Ok(AppState::new(store, issuer, dispatcher, LiveFeed::new(config.live_feed_capacity)))
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full axum [`Router`]: public routes open, admin routes behind
/// Basic auth, everything under `/api`.
pub fn router<S>(state: AppState<S>, auth: AuthConfig) -> Router
where
  S: TicketStore + 'static,
{
  let admin = admit_api::admin_router(state.clone())
    .route_layer(middleware::from_fn_with_state(Arc::new(auth), require_auth));

  Router::new()
    .nest("/api", admit_api::public_router(state).merge(admin))
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ───────────────────────────────────────────────────────
