//! The purchase workflow.
//!
//! `Received → Validated → AvailabilityChecked → CustomerResolved →
//! OrderRecorded → CredentialsIssued → NotificationAttempted → Responded`
//!
//! A failure before `OrderRecorded` aborts the purchase and nothing is sold.
//! From `OrderRecorded` on, the buyer has paid and stock is gone, so later
//! failures are logged and reported in the [`PurchaseReceipt`] instead.
//! Recording and everything after it run on a detached task, so a client
//! that disconnects mid-purchase cannot leave a paid order unfulfilled.

use std::sync::Arc;

use admit_core::{
  broadcast::Broadcaster,
  credential::Credential,
  customer::Customer,
  event::{Event, TicketCategory},
  identity::{self, ContactDetails},
  inventory::check_availability,
  notify::Dispatcher,
  order::{NewOrder, Order, Payment},
  store::TicketStore,
};
use admit_credential::{CredentialIssuer, IssuedCredential, render};
use admit_notify::{Confirmation, TicketImage, confirmation_message};
use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;
use tracing::Instrument as _;
use uuid::Uuid;

/// Live-feed topic published once per recorded order.
pub const PURCHASE_TOPIC: &str = "purchase.completed";

#[derive(Debug, Error)]
pub enum CheckoutError {
  #[error(transparent)]
  Rejected(#[from] admit_core::Error),

  #[error(transparent)]
  Credential(#[from] admit_credential::Error),
}

/// A purchase as accepted from the outside world, not yet validated.
#[derive(Debug, Clone)]
pub struct PurchaseInput {
  pub category_id: Uuid,
  pub quantity:    u32,
  pub contact:     ContactDetails,
  pub payment:     Payment,
  pub metadata:    serde_json::Value,
}

/// Everything the buyer gets back from a successful purchase.
#[derive(Debug, Clone)]
pub struct PurchaseReceipt {
  pub order:               Order,
  pub customer:            Customer,
  pub event:               Event,
  pub category:            TicketCategory,
  /// Empty when `credentials_pending` is set.
  pub credentials:         Vec<IssuedCredential>,
  /// Issuance failed after the order was recorded; re-issue by order id.
  pub credentials_pending: bool,
  pub notification_sent:   bool,
}

/// Outcome of [`Checkout::reissue`].
#[derive(Debug, Clone)]
pub struct Reissue {
  pub credentials:       Vec<IssuedCredential>,
  /// A confirmation carrying the new credentials went out. Always `false`
  /// when nothing was missing.
  pub notification_sent: bool,
}

struct Fulfilment {
  credentials:         Vec<IssuedCredential>,
  credentials_pending: bool,
  notification_sent:   bool,
}

fn into_core<E: Into<admit_core::Error>>(e: E) -> admit_core::Error { e.into() }

/// Render stored credentials for display.
pub fn render_all(credentials: Vec<Credential>) -> admit_credential::Result<Vec<IssuedCredential>> {
  credentials
    .into_iter()
    .map(|credential| {
      let rendering = render(&credential.token)?;
      Ok(IssuedCredential { credential, rendering })
    })
    .collect()
}

// ─── Orchestrator ────────────────────────────────────────────────────────────

/// Runs purchases against a store, an issuer, a notification chain and a
/// live-feed sink, all injected at construction.
pub struct Checkout<S> {
  store:       Arc<S>,
  issuer:      Arc<CredentialIssuer>,
  dispatcher:  Arc<Dispatcher>,
  broadcaster: Arc<dyn Broadcaster>,
}

impl<S> Clone for Checkout<S> {
  fn clone(&self) -> Self {
    Self {
      store:       self.store.clone(),
      issuer:      self.issuer.clone(),
      dispatcher:  self.dispatcher.clone(),
      broadcaster: self.broadcaster.clone(),
    }
  }
}

impl<S> Checkout<S>
where
  S: TicketStore + 'static,
{
  pub fn new(
    store:       Arc<S>,
    issuer:      Arc<CredentialIssuer>,
    dispatcher:  Arc<Dispatcher>,
    broadcaster: Arc<dyn Broadcaster>,
  ) -> Self {
    Self { store, issuer, dispatcher, broadcaster }
  }

  pub fn issuer(&self) -> &CredentialIssuer { &self.issuer }

  /// Run one purchase end to end.
  pub async fn purchase(&self, input: PurchaseInput) -> admit_core::Result<PurchaseReceipt> {
    let span = tracing::info_span!(
      "purchase",
      category_id = %input.category_id,
      quantity = input.quantity,
      order_id = tracing::field::Empty
    );
    self.run(input).instrument(span).await
  }

  async fn run(&self, input: PurchaseInput) -> admit_core::Result<PurchaseReceipt> {
    // ── Validated ──
    if input.quantity == 0 {
      return Err(admit_core::Error::Validation("quantity must be at least 1".into()));
    }
    let profile = identity::normalize(&input.contact)?;
    if input.payment.method.trim().is_empty() {
      return Err(admit_core::Error::Validation("payment.method is required".into()));
    }
    if input.payment.reference.trim().is_empty() {
      return Err(admit_core::Error::Validation(
        "payment.payment_intent_id or payment.transaction_id is required".into(),
      ));
    }

    // ── AvailabilityChecked ──
    let category = self
      .store
      .get_category(input.category_id)
      .await
      .map_err(into_core)?
      .ok_or(admit_core::Error::CategoryNotFound(input.category_id))?;
    let now = Utc::now();
    check_availability(&category, input.quantity, now)?;
    let event = self
      .store
      .get_event(category.event_id)
      .await
      .map_err(into_core)?
      .ok_or(admit_core::Error::EventNotFound(category.event_id))?;

    // ── CustomerResolved ──
    let customer = identity::resolve(self.store.as_ref(), profile).await?;

    let new_order = NewOrder {
      customer_id: customer.customer_id,
      event_id:    event.event_id,
      category_id: category.category_id,
      quantity:    input.quantity,
      unit_price:  category.unit_price,
      currency:    category.currency.clone(),
      payment:     input.payment,
      metadata:    input.metadata,
    };

    // Detached before the write: once the order commits, the remaining
    // stages finish even if this future is dropped.
    let task = {
      let this = self.clone();
      let (customer, event, category) = (customer.clone(), event.clone(), category.clone());
      tokio::spawn(
        async move { this.record_and_fulfil(new_order, now, &customer, &event, &category).await }
          .instrument(tracing::Span::current()),
      )
    };
    let (order, fulfilment) = task.await.map_err(|e| {
      tracing::error!(error = %e, "purchase task did not complete");
      admit_core::Error::Persistence(Box::new(e))
    })??;

    Ok(PurchaseReceipt {
      order,
      customer,
      event,
      category,
      credentials: fulfilment.credentials,
      credentials_pending: fulfilment.credentials_pending,
      notification_sent: fulfilment.notification_sent,
    })
  }

  async fn record_and_fulfil(
    &self,
    input:    NewOrder,
    now:      DateTime<Utc>,
    customer: &Customer,
    event:    &Event,
    category: &TicketCategory,
  ) -> admit_core::Result<(Order, Fulfilment)> {
    // ── OrderRecorded ──
    let order = self.store.record_order(input, now).await.map_err(into_core)?;
    tracing::Span::current().record("order_id", tracing::field::display(order.order_id));
    tracing::info!(total_amount = order.total_amount, currency = %order.currency, "order recorded");

    let fulfilment = self.fulfil(&order, customer, event, category).await;
    Ok((order, fulfilment))
  }

  async fn fulfil(
    &self,
    order:    &Order,
    customer: &Customer,
    event:    &Event,
    category: &TicketCategory,
  ) -> Fulfilment {
    // ── CredentialsIssued ──
    let (credentials, credentials_pending) = match self.issue(order).await {
      Ok(issued) => (issued, false),
      Err(e) => {
        tracing::warn!(error = %e, "credentials not issued, order kept for re-issuance");
        (Vec::new(), true)
      }
    };

    self.broadcaster.publish(
      PURCHASE_TOPIC,
      json!({
        "order_id":      order.order_id,
        "event_id":      event.event_id,
        "event":         event.name,
        "category_id":   category.category_id,
        "category":      category.name,
        "quantity":      order.quantity,
        "total_amount":  order.total_amount,
        "currency":      order.currency,
        "created_at":    order.created_at,
      }),
    );

    // ── NotificationAttempted ──
    let notification_sent = self.notify(order, customer, event, category, &credentials).await;

    Fulfilment { credentials, credentials_pending, notification_sent }
  }

  /// Send the confirmation for `order`. Failure is logged, never raised.
  async fn notify(
    &self,
    order:       &Order,
    customer:    &Customer,
    event:       &Event,
    category:    &TicketCategory,
    credentials: &[IssuedCredential],
  ) -> bool {
    let message = confirmation_message(&Confirmation {
      to_email: &customer.email,
      to_name: &customer.name,
      order,
      event,
      category,
      tickets: credentials
        .iter()
        .map(|i| TicketImage {
          sequence: i.credential.sequence,
          data_url: &i.rendering.png_data_url,
        })
        .collect(),
    });
    match self.dispatcher.dispatch(&message).await {
      Ok(dispatched) => {
        tracing::info!(backend = %dispatched.backend, "confirmation sent");
        true
      }
      Err(e) => {
        tracing::warn!(error = %e, "confirmation not sent");
        false
      }
    }
  }

  async fn issue(&self, order: &Order) -> Result<Vec<IssuedCredential>, CheckoutError> {
    let issued = self.issuer.issue_rendered(order, Utc::now())?;
    let credentials = issued.iter().map(|i| i.credential.clone()).collect();
    let stored = self
      .store
      .record_credentials(order.order_id, credentials)
      .await
      .map_err(into_core)?;
    tracing::info!(count = stored.len(), "credentials issued");
    Ok(issued)
  }

  /// Issue whatever credentials `order_id` is missing and return the full,
  /// rendered set. Safe to call any number of times; the buyer is emailed
  /// only when something new was issued.
  pub async fn reissue(&self, order_id: Uuid) -> Result<Reissue, CheckoutError> {
    let order = self
      .store
      .get_order(order_id)
      .await
      .map_err(into_core)?
      .ok_or(admit_core::Error::OrderNotFound(order_id))?;
    let existing = self.store.get_credentials(order_id).await.map_err(into_core)?;

    let missing = self.issuer.issue_missing(&order, &existing, Utc::now())?;
    if missing.is_empty() {
      return Ok(Reissue { credentials: render_all(existing)?, notification_sent: false });
    }

    tracing::info!(%order_id, count = missing.len(), "re-issuing credentials");
    let stored = self
      .store
      .record_credentials(order_id, missing)
      .await
      .map_err(into_core)?;
    let credentials = render_all(stored)?;
    let notification_sent = self.notify_reissued(&order, &credentials).await;

    Ok(Reissue { credentials, notification_sent })
  }

  async fn notify_reissued(&self, order: &Order, credentials: &[IssuedCredential]) -> bool {
    let context = async {
      let customer = self.store.get_customer(order.customer_id).await.map_err(into_core)?;
      let event = self.store.get_event(order.event_id).await.map_err(into_core)?;
      let category = self.store.get_category(order.category_id).await.map_err(into_core)?;
      Ok::<_, admit_core::Error>(customer.zip(event).zip(category))
    };
    match context.await {
      Ok(Some(((customer, event), category))) => {
        self.notify(order, &customer, &event, &category, credentials).await
      }
      Ok(None) => {
        tracing::warn!(order_id = %order.order_id, "order context missing, confirmation not sent");
        false
      }
      Err(e) => {
        tracing::warn!(order_id = %order.order_id, error = %e, "confirmation not sent");
        false
      }
    }
  }
}
