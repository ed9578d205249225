//! JSON REST API for Admit.
//!
//! Exposes two axum routers backed by any [`admit_core::store::TicketStore`]:
//! [`public_router`] for buyers and scanners, [`admin_router`] for event
//! staff. Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! Router::new().nest(
//!   "/api",
//!   admit_api::public_router(state.clone())
//!     .merge(admit_api::admin_router(state).route_layer(auth)),
//! )
//! ```

pub mod categories;
pub mod checkout;
pub mod credentials;
pub mod error;
pub mod events;
pub mod live;
pub mod orders;
pub mod purchase;

use std::sync::Arc;

use admit_core::{notify::Dispatcher, store::TicketStore};
use admit_credential::CredentialIssuer;
use axum::{
  Router,
  extract::FromRef,
  routing::{get, post, put},
};

pub use checkout::{Checkout, CheckoutError, PurchaseInput, PurchaseReceipt, Reissue};
pub use error::ApiError;
pub use live::LiveFeed;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub checkout: Checkout<S>,
  pub live:     LiveFeed,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    self.store.clone(),
      checkout: self.checkout.clone(),
      live:     self.live.clone(),
    }
  }
}

impl<S> FromRef<AppState<S>> for LiveFeed {
  fn from_ref(state: &AppState<S>) -> Self { state.live.clone() }
}

impl<S> AppState<S>
where
  S: TicketStore + 'static,
{
  /// Wire the purchase workflow to `store`, publishing to `live`.
  pub fn new(
    store:      Arc<S>,
    issuer:     CredentialIssuer,
    dispatcher: Dispatcher,
    live:       LiveFeed,
  ) -> Self {
    let checkout = Checkout::new(
      store.clone(),
      Arc::new(issuer),
      Arc::new(dispatcher),
      Arc::new(live.clone()),
    );
    Self { store, checkout, live }
  }
}

// ─── Routers ─────────────────────────────────────────────────────────────────

/// Unauthenticated routes: purchasing, availability, scanning, live feed.
pub fn public_router<S>(state: AppState<S>) -> Router<()>
where
  S: TicketStore + 'static,
{
  Router::new()
    .route("/purchase", post(purchase::handler::<S>))
    .route("/categories/{id}/availability", get(categories::availability::<S>))
    .route("/credentials/verify", post(credentials::verify::<S>))
    .route("/live", get(live::stream))
    .with_state(state)
}

/// Staff routes under `/admin`. Mount behind authentication.
pub fn admin_router<S>(state: AppState<S>) -> Router<()>
where
  S: TicketStore + 'static,
{
  Router::new()
    // Events
    .route("/admin/events", get(events::list::<S>).post(events::create::<S>))
    .route(
      "/admin/events/{id}/categories",
      get(categories::list::<S>).post(categories::create::<S>),
    )
    // Categories
    .route("/admin/categories/{id}/price", put(categories::update_price::<S>))
    // Orders
    .route("/admin/orders", get(orders::list::<S>))
    .route("/admin/orders/{id}", get(orders::get_one::<S>))
    .route("/admin/orders/{id}/credentials", post(orders::reissue::<S>))
    .with_state(state)
}

// ─── Integration tests ───────────────────────────────────────────────────────
