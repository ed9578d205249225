//! The `TicketStore` trait.
//!
//! Implemented by storage backends (e.g. `admit-store-sqlite`). Higher layers
//! (`admit-api`, `admit-server`) depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  credential::Credential,
  customer::{Customer, CustomerProfile},
  event::{Event, NewEvent, NewTicketCategory, TicketCategory},
  order::{NewOrder, Order},
};

/// Abstraction over a transactional record store.
///
/// Backend errors must convert into [`crate::Error`] so the purchase workflow
/// can tell domain rejections (unknown category, sold out) apart from
/// persistence failures.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait TicketStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + Into<crate::Error> + 'static;

  // ── Events ────────────────────────────────────────────────────────────

  fn create_event(
    &self,
    input: NewEvent,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  fn get_event(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  fn list_events(
    &self,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + '_;

  // ── Ticket categories ─────────────────────────────────────────────────

  /// Create a category with `sold = 0`. Fails if the event does not exist.
  fn create_category(
    &self,
    input: NewTicketCategory,
  ) -> impl Future<Output = Result<TicketCategory, Self::Error>> + Send + '_;

  fn get_category(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<TicketCategory>, Self::Error>> + Send + '_;

  fn list_categories(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<Vec<TicketCategory>, Self::Error>> + Send + '_;

  /// Change the unit price. Already recorded orders keep their snapshot.
  fn update_category_price(
    &self,
    id: Uuid,
    unit_price: i64,
  ) -> impl Future<Output = Result<TicketCategory, Self::Error>> + Send + '_;

  /// Atomically add `qty` to the sold count, returning the new count.
  ///
  /// Must be a single conditional update that re-validates
  /// `sold + qty <= total`; a rejected update is reported as
  /// [`Availability::Oversold`](crate::Availability::Oversold).
  fn decrement_inventory(
    &self,
    category_id: Uuid,
    qty: u32,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + '_;

  // ── Customers ─────────────────────────────────────────────────────────

  /// Insert a customer for `profile.email`, or merge the non-`None` fields
  /// of `profile` into the existing one. Atomic per email.
  fn upsert_customer(
    &self,
    profile: CustomerProfile,
  ) -> impl Future<Output = Result<Customer, Self::Error>> + Send + '_;

  fn get_customer(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Customer>, Self::Error>> + Send + '_;

  fn find_customer_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Customer>, Self::Error>> + Send + 'a;

  // ── Orders ────────────────────────────────────────────────────────────

  /// Record an order and decrement its category's inventory as one atomic
  /// unit. Either both happen or neither does.
  ///
  /// Re-checks the sale window at `now` and the stock bound at write time.
  fn record_order(
    &self,
    input: NewOrder,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Order, Self::Error>> + Send + '_;

  fn get_order(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Order>, Self::Error>> + Send + '_;

  /// List orders, newest first, optionally restricted to one event.
  fn list_orders(
    &self,
    event_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<Order>, Self::Error>> + Send + '_;

  // ── Credentials ───────────────────────────────────────────────────────

  /// Persist credentials for an order. Sequences that already exist are
  /// left untouched; returns every stored credential for the order ordered
  /// by sequence.
  fn record_credentials(
    &self,
    order_id: Uuid,
    credentials: Vec<Credential>,
  ) -> impl Future<Output = Result<Vec<Credential>, Self::Error>> + Send + '_;

  /// All credentials of an order, ordered by sequence.
  fn get_credentials(
    &self,
    order_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Credential>, Self::Error>> + Send + '_;
}
