//! Integration tests for `SqliteStore` against an in-memory database.

use admit_core::{
  Availability,
  credential::Credential,
  customer::{CustomerProfile, Role},
  event::{NewEvent, NewTicketCategory, TicketCategory},
  order::{NewOrder, Payment},
  store::TicketStore,
};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn category(s: &SqliteStore, total: u32) -> TicketCategory {
  let event = s
    .create_event(NewEvent {
      name:      "RustConf".into(),
      venue:     Some("Hall A".into()),
      starts_at: Utc::now() + Duration::days(30),
    })
    .await
    .unwrap();

  s.create_category(NewTicketCategory {
    event_id:    event.event_id,
    name:        "General".into(),
    unit_price:  4_900,
    currency:    "usd".into(),
    total,
    sales_start: None,
    sales_end:   None,
  })
  .await
  .unwrap()
}

fn profile(email: &str) -> CustomerProfile {
  CustomerProfile {
    email:     email.into(),
    name:      "Alice Liddell".into(),
    phone:     None,
    company:   None,
    job_title: None,
  }
}

fn new_order(customer_id: Uuid, category: &TicketCategory, quantity: u32) -> NewOrder {
  NewOrder {
    customer_id,
    event_id: category.event_id,
    category_id: category.category_id,
    quantity,
    unit_price: category.unit_price,
    currency: category.currency.clone(),
    payment: Payment { method: "card".into(), reference: "pi_test".into() },
    metadata: serde_json::json!({ "source": "test" }),
  }
}

fn is_unavailable(err: &Error) -> bool {
  matches!(err, Error::Core(admit_core::Error::Unavailable(_)))
}

// ─── Events & categories ─────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_event() {
  let s = store().await;
  let event = s
    .create_event(NewEvent {
      name:      "  Meetup ".into(),
      venue:     None,
      starts_at: Utc::now(),
    })
    .await
    .unwrap();
  assert_eq!(event.name, "Meetup");

  let fetched = s.get_event(event.event_id).await.unwrap().unwrap();
  assert_eq!(fetched.event_id, event.event_id);
  assert_eq!(fetched.starts_at, event.starts_at);

  assert_eq!(s.list_events().await.unwrap().len(), 1);
  assert!(s.get_event(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn category_starts_unsold_with_normalized_currency() {
  let s = store().await;
  let c = category(&s, 10).await;
  assert_eq!(c.sold, 0);
  assert_eq!(c.currency, "USD");

  let fetched = s.get_category(c.category_id).await.unwrap().unwrap();
  assert_eq!(fetched, c);
  assert_eq!(s.list_categories(c.event_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn category_for_unknown_event_errors() {
  let s = store().await;
  let missing = Uuid::new_v4();
  let err = s
    .create_category(NewTicketCategory {
      event_id:    missing,
      name:        "VIP".into(),
      unit_price:  100,
      currency:    "EUR".into(),
      total:       1,
      sales_start: None,
      sales_end:   None,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(admit_core::Error::EventNotFound(id)) if id == missing));
}

// ─── Inventory ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn decrement_increments_sold_atomically() {
  let s = store().await;
  let c = category(&s, 5).await;

  assert_eq!(s.decrement_inventory(c.category_id, 2).await.unwrap(), 2);
  assert_eq!(s.decrement_inventory(c.category_id, 3).await.unwrap(), 5);

  let err = s.decrement_inventory(c.category_id, 1).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(admit_core::Error::Unavailable(Availability::Oversold { requested: 1 }))
  ));
  assert_eq!(s.get_category(c.category_id).await.unwrap().unwrap().sold, 5);
}

#[tokio::test]
async fn decrement_unknown_category_errors() {
  let s = store().await;
  let err = s.decrement_inventory(Uuid::new_v4(), 1).await.unwrap_err();
  assert!(matches!(err, Error::Core(admit_core::Error::CategoryNotFound(_))));
}

// ─── Customers ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_same_profile_is_idempotent() {
  let s = store().await;
  let first = s.upsert_customer(profile("alice@example.com")).await.unwrap();
  let second = s.upsert_customer(profile("alice@example.com")).await.unwrap();

  assert_eq!(first.customer_id, second.customer_id);
  assert_eq!(first.role, Role::Attendee);
  assert_eq!(s.count_rows("customers").await.unwrap(), 1);
}

#[tokio::test]
async fn upsert_merges_supplied_fields_only() {
  let s = store().await;
  let mut p = profile("alice@example.com");
  p.phone = Some("+1 555 0100".into());
  p.company = Some("Wonderland Ltd".into());
  s.upsert_customer(p).await.unwrap();

  let mut update = profile("alice@example.com");
  update.name = "Alice L.".into();
  update.job_title = Some("Explorer".into());
  let merged = s.upsert_customer(update).await.unwrap();

  assert_eq!(merged.name, "Alice L.");
  assert_eq!(merged.phone.as_deref(), Some("+1 555 0100"));
  assert_eq!(merged.company.as_deref(), Some("Wonderland Ltd"));
  assert_eq!(merged.job_title.as_deref(), Some("Explorer"));
}

#[tokio::test]
async fn find_customer_by_email_normalizes_lookup() {
  let s = store().await;
  let created = s.upsert_customer(profile("alice@example.com")).await.unwrap();
  let found = s
    .find_customer_by_email(" ALICE@example.com ")
    .await
    .unwrap()
    .unwrap();
  assert_eq!(found.customer_id, created.customer_id);

  let by_id = s.get_customer(created.customer_id).await.unwrap().unwrap();
  assert_eq!(by_id.email, "alice@example.com");
}

// ─── Orders ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn last_unit_sells_and_fills_category() {
  let s = store().await;
  let c = category(&s, 10).await;
  let customer = s.upsert_customer(profile("a@example.com")).await.unwrap();
  s.decrement_inventory(c.category_id, 9).await.unwrap();

  let order = s
    .record_order(new_order(customer.customer_id, &c, 1), Utc::now())
    .await
    .unwrap();

  assert_eq!(order.total_amount, 4_900);
  assert_eq!(s.get_category(c.category_id).await.unwrap().unwrap().sold, 10);
  assert_eq!(s.get_order(order.order_id).await.unwrap().unwrap(), order);
}

#[tokio::test]
async fn sold_out_category_records_nothing() {
  let s = store().await;
  let c = category(&s, 10).await;
  let customer = s.upsert_customer(profile("a@example.com")).await.unwrap();
  s.decrement_inventory(c.category_id, 10).await.unwrap();

  let err = s
    .record_order(new_order(customer.customer_id, &c, 1), Utc::now())
    .await
    .unwrap_err();

  assert!(is_unavailable(&err));
  assert_eq!(s.count_rows("orders").await.unwrap(), 0);
  assert_eq!(s.get_category(c.category_id).await.unwrap().unwrap().sold, 10);
}

#[tokio::test]
async fn oversized_order_rolls_back() {
  let s = store().await;
  let c = category(&s, 3).await;
  let customer = s.upsert_customer(profile("a@example.com")).await.unwrap();

  let err = s
    .record_order(new_order(customer.customer_id, &c, 4), Utc::now())
    .await
    .unwrap_err();

  assert!(matches!(
    err,
    Error::Core(admit_core::Error::Unavailable(Availability::Oversold { requested: 4 }))
  ));
  assert_eq!(s.count_rows("orders").await.unwrap(), 0);
  assert_eq!(s.get_category(c.category_id).await.unwrap().unwrap().sold, 0);
}

#[tokio::test]
async fn order_outside_sale_window_is_rejected() {
  let s = store().await;
  let event = s
    .create_event(NewEvent { name: "Gig".into(), venue: None, starts_at: Utc::now() })
    .await
    .unwrap();
  let c = s
    .create_category(NewTicketCategory {
      event_id:    event.event_id,
      name:        "Early bird".into(),
      unit_price:  1_000,
      currency:    "GBP".into(),
      total:       100,
      sales_start: Some(Utc::now() - Duration::days(10)),
      sales_end:   Some(Utc::now() - Duration::days(1)),
    })
    .await
    .unwrap();
  let customer = s.upsert_customer(profile("a@example.com")).await.unwrap();

  let err = s
    .record_order(new_order(customer.customer_id, &c, 1), Utc::now())
    .await
    .unwrap_err();

  assert!(matches!(
    err,
    Error::Core(admit_core::Error::Unavailable(Availability::SalesEnded { .. }))
  ));
  assert_eq!(s.get_category(c.category_id).await.unwrap().unwrap().sold, 0);
}

#[tokio::test]
async fn total_is_unaffected_by_later_price_change() {
  let s = store().await;
  let c = category(&s, 10).await;
  let customer = s.upsert_customer(profile("a@example.com")).await.unwrap();

  let order = s
    .record_order(new_order(customer.customer_id, &c, 2), Utc::now())
    .await
    .unwrap();
  let repriced = s.update_category_price(c.category_id, 9_900).await.unwrap();
  assert_eq!(repriced.unit_price, 9_900);

  let stored = s.get_order(order.order_id).await.unwrap().unwrap();
  assert_eq!(stored.unit_price, 4_900);
  assert_eq!(stored.total_amount, 9_800);
}

#[tokio::test]
async fn concurrent_orders_never_oversell() {
  let s = store().await;
  let c = category(&s, 5).await;
  let customer = s.upsert_customer(profile("a@example.com")).await.unwrap();

  let mut handles = Vec::new();
  for _ in 0..20 {
    let s = s.clone();
    let input = new_order(customer.customer_id, &c, 1);
    handles.push(tokio::spawn(async move { s.record_order(input, Utc::now()).await }));
  }

  let mut approved = 0;
  let mut rejected = 0;
  for h in handles {
    match h.await.unwrap() {
      Ok(_) => approved += 1,
      Err(e) if is_unavailable(&e) => rejected += 1,
      Err(e) => panic!("unexpected error: {e}"),
    }
  }

  assert_eq!(approved, 5);
  assert_eq!(rejected, 15);
  assert_eq!(s.get_category(c.category_id).await.unwrap().unwrap().sold, 5);
  assert_eq!(s.count_rows("orders").await.unwrap(), 5);
}

#[tokio::test]
async fn list_orders_filters_by_event() {
  let s = store().await;
  let a = category(&s, 10).await;
  let b = category(&s, 10).await;
  let customer = s.upsert_customer(profile("a@example.com")).await.unwrap();

  s.record_order(new_order(customer.customer_id, &a, 1), Utc::now()).await.unwrap();
  s.record_order(new_order(customer.customer_id, &b, 1), Utc::now()).await.unwrap();
  s.record_order(new_order(customer.customer_id, &b, 2), Utc::now()).await.unwrap();

  assert_eq!(s.list_orders(None).await.unwrap().len(), 3);
  assert_eq!(s.list_orders(Some(b.event_id)).await.unwrap().len(), 2);
}

// ─── Credentials ─────────────────────────────────────────────────────────────

fn credential(order_id: Uuid, sequence: u32, token: &str) -> Credential {
  Credential { order_id, sequence, token: token.into(), issued_at: Utc::now() }
}

#[tokio::test]
async fn record_credentials_keeps_existing_sequences() {
  let s = store().await;
  let c = category(&s, 10).await;
  let customer = s.upsert_customer(profile("a@example.com")).await.unwrap();
  let order = s
    .record_order(new_order(customer.customer_id, &c, 3), Utc::now())
    .await
    .unwrap();

  let first = s
    .record_credentials(order.order_id, vec![credential(order.order_id, 1, "t1")])
    .await
    .unwrap();
  assert_eq!(first.len(), 1);

  let all = s
    .record_credentials(
      order.order_id,
      vec![
        credential(order.order_id, 1, "replacement"),
        credential(order.order_id, 2, "t2"),
        credential(order.order_id, 3, "t3"),
      ],
    )
    .await
    .unwrap();

  let tokens: Vec<&str> = all.iter().map(|c| c.token.as_str()).collect();
  assert_eq!(tokens, ["t1", "t2", "t3"]);
  assert_eq!(s.get_credentials(order.order_id).await.unwrap(), all);
}

#[tokio::test]
async fn record_credentials_for_unknown_order_errors() {
  let s = store().await;
  let missing = Uuid::new_v4();
  let err = s
    .record_credentials(missing, vec![credential(missing, 1, "t")])
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(admit_core::Error::OrderNotFound(_))));
}
