//! [`SqliteStore`], the SQLite implementation of [`TicketStore`].

use std::path::Path;

use admit_core::{
  Availability,
  credential::Credential,
  customer::{Customer, CustomerProfile},
  event::{Event, NewEvent, NewTicketCategory, TicketCategory},
  inventory::check_sale_window,
  order::{NewOrder, Order},
  store::TicketStore,
};
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    CATEGORY_COLUMNS, CUSTOMER_COLUMNS, EVENT_COLUMNS, ORDER_COLUMNS, RawCategory,
    RawCredential, RawCustomer, RawEvent, RawOrder, decode_count, encode_dt, encode_role,
    encode_status, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Admit ticket store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Every
/// statement runs on the connection's one background thread, and every
/// multi-statement write runs inside a transaction.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Result of the conditional `sold` increment.
enum Increment {
  Applied(i64),
  /// The update matched no row. Carries the category row if it exists, so
  /// the caller can tell "unknown category" from "rejected".
  Rejected(Option<RawCategory>),
}

/// `sold = sold + qty`, guarded by `sold + qty <= total` and, when `now` is
/// given, by the sale window. Runs as one statement.
fn increment_sold(
  conn: &rusqlite::Connection,
  category_id: &str,
  qty: i64,
  now: Option<&str>,
) -> rusqlite::Result<Increment> {
  let new_sold: Option<i64> = conn
    .query_row(
      "UPDATE ticket_categories
          SET sold = sold + ?2
        WHERE category_id = ?1
          AND sold + ?2 <= total
          AND (?3 IS NULL OR (
                (sales_start IS NULL OR sales_start <= ?3)
            AND (sales_end   IS NULL OR sales_end   >= ?3)))
        RETURNING sold",
      rusqlite::params![category_id, qty, now],
      |r| r.get(0),
    )
    .optional()?;

  if let Some(sold) = new_sold {
    return Ok(Increment::Applied(sold));
  }

  let raw = conn
    .query_row(
      &format!("SELECT {CATEGORY_COLUMNS} FROM ticket_categories WHERE category_id = ?1"),
      rusqlite::params![category_id],
      RawCategory::from_row,
    )
    .optional()?;
  Ok(Increment::Rejected(raw))
}

/// Explain why an increment was rejected.
fn rejection(
  category_id: Uuid,
  requested: u32,
  raw: Option<RawCategory>,
  now: Option<DateTime<Utc>>,
) -> Error {
  let Some(raw) = raw else {
    return admit_core::Error::CategoryNotFound(category_id).into();
  };
  let category = match raw.into_category() {
    Ok(c) => c,
    Err(e) => return e,
  };
  if let Some(now) = now
    && let Err(reason) = check_sale_window(&category, now)
  {
    return admit_core::Error::Unavailable(reason).into();
  }
  admit_core::Error::Unavailable(Availability::Oversold { requested }).into()
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Number of rows in `table`. Only used to assert side effects in tests.
  #[cfg(test)]
  pub(crate) async fn count_rows(&self, table: &'static str) -> Result<i64> {
    Ok(
      self
        .conn
        .call(move |conn| Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?))
        .await?,
    )
  }
}

// ─── TicketStore impl ────────────────────────────────────────────────────────

impl TicketStore for SqliteStore {
  type Error = Error;

  // ── Events ────────────────────────────────────────────────────────────────

  async fn create_event(&self, input: NewEvent) -> Result<Event> {
    input.validate()?;

    let event = Event {
      event_id:   Uuid::new_v4(),
      name:       input.name.trim().to_owned(),
      venue:      input.venue,
      starts_at:  input.starts_at,
      created_at: Utc::now(),
    };

    let id_str     = encode_uuid(event.event_id);
    let name       = event.name.clone();
    let venue      = event.venue.clone();
    let starts_str = encode_dt(event.starts_at);
    let at_str     = encode_dt(event.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO events (event_id, name, venue, starts_at, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, name, venue, starts_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(event)
  }

  async fn get_event(&self, id: Uuid) -> Result<Option<Event>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {EVENT_COLUMNS} FROM events WHERE event_id = ?1"),
              rusqlite::params![id_str],
              RawEvent::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEvent::into_event).transpose()
  }

  async fn list_events(&self) -> Result<Vec<Event>> {
    let raws: Vec<RawEvent> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY starts_at"))?;
        let rows = stmt
          .query_map([], RawEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  // ── Ticket categories ─────────────────────────────────────────────────────

  async fn create_category(&self, mut input: NewTicketCategory) -> Result<TicketCategory> {
    input.normalize()?;

    if self.get_event(input.event_id).await?.is_none() {
      return Err(admit_core::Error::EventNotFound(input.event_id).into());
    }

    let category = TicketCategory {
      category_id: Uuid::new_v4(),
      event_id:    input.event_id,
      name:        input.name.trim().to_owned(),
      unit_price:  input.unit_price,
      currency:    input.currency,
      total:       input.total,
      sold:        0,
      sales_start: input.sales_start,
      sales_end:   input.sales_end,
    };

    let id_str    = encode_uuid(category.category_id);
    let event_str = encode_uuid(category.event_id);
    let name      = category.name.clone();
    let price     = category.unit_price;
    let currency  = category.currency.clone();
    let total     = i64::from(category.total);
    let start_str = category.sales_start.map(encode_dt);
    let end_str   = category.sales_end.map(encode_dt);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO ticket_categories (
             category_id, event_id, name, unit_price, currency, total, sold,
             sales_start, sales_end
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8)",
          rusqlite::params![id_str, event_str, name, price, currency, total, start_str, end_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(category)
  }

  async fn get_category(&self, id: Uuid) -> Result<Option<TicketCategory>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawCategory> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {CATEGORY_COLUMNS} FROM ticket_categories WHERE category_id = ?1"),
              rusqlite::params![id_str],
              RawCategory::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCategory::into_category).transpose()
  }

  async fn list_categories(&self, event_id: Uuid) -> Result<Vec<TicketCategory>> {
    let event_str = encode_uuid(event_id);

    let raws: Vec<RawCategory> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CATEGORY_COLUMNS} FROM ticket_categories WHERE event_id = ?1 ORDER BY name"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![event_str], RawCategory::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCategory::into_category).collect()
  }

  async fn update_category_price(&self, id: Uuid, unit_price: i64) -> Result<TicketCategory> {
    if unit_price < 0 {
      return Err(admit_core::Error::Validation("unit_price must not be negative".into()).into());
    }
    let id_str = encode_uuid(id);

    let raw: Option<RawCategory> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "UPDATE ticket_categories SET unit_price = ?2 WHERE category_id = ?1
                 RETURNING {CATEGORY_COLUMNS}"
              ),
              rusqlite::params![id_str, unit_price],
              RawCategory::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    match raw {
      Some(raw) => raw.into_category(),
      None => Err(admit_core::Error::CategoryNotFound(id).into()),
    }
  }

  async fn decrement_inventory(&self, category_id: Uuid, qty: u32) -> Result<u32> {
    if qty == 0 {
      return Err(admit_core::Error::Validation("quantity must be at least 1".into()).into());
    }
    let id_str = encode_uuid(category_id);
    let delta  = i64::from(qty);

    let outcome = self
      .conn
      .call(move |conn| Ok(increment_sold(conn, &id_str, delta, None)?))
      .await?;

    match outcome {
      Increment::Applied(sold) => decode_count(sold),
      Increment::Rejected(raw) => Err(rejection(category_id, qty, raw, None)),
    }
  }

  // ── Customers ─────────────────────────────────────────────────────────────

  async fn upsert_customer(&self, profile: CustomerProfile) -> Result<Customer> {
    let id_str = encode_uuid(Uuid::new_v4());
    let at_str = encode_dt(Utc::now());
    let role   = encode_role(Default::default());

    let raw: RawCustomer = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &format!(
            "INSERT INTO customers (
               customer_id, email, name, phone, company, job_title, role,
               created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
             ON CONFLICT (email) DO UPDATE SET
               name       = excluded.name,
               phone      = COALESCE(excluded.phone,     customers.phone),
               company    = COALESCE(excluded.company,   customers.company),
               job_title  = COALESCE(excluded.job_title, customers.job_title),
               updated_at = excluded.updated_at
             RETURNING {CUSTOMER_COLUMNS}"
          ),
          rusqlite::params![
            id_str,
            profile.email,
            profile.name,
            profile.phone,
            profile.company,
            profile.job_title,
            role,
            at_str,
          ],
          RawCustomer::from_row,
        )?)
      })
      .await?;

    raw.into_customer()
  }

  async fn get_customer(&self, id: Uuid) -> Result<Option<Customer>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawCustomer> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE customer_id = ?1"),
              rusqlite::params![id_str],
              RawCustomer::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCustomer::into_customer).transpose()
  }

  async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>> {
    let email = email.trim().to_ascii_lowercase();

    let raw: Option<RawCustomer> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE email = ?1"),
              rusqlite::params![email],
              RawCustomer::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCustomer::into_customer).transpose()
  }

  // ── Orders ────────────────────────────────────────────────────────────────

  async fn record_order(&self, input: NewOrder, now: DateTime<Utc>) -> Result<Order> {
    let order = input.into_order(now)?;

    let order_id_str    = encode_uuid(order.order_id);
    let customer_id_str = encode_uuid(order.customer_id);
    let event_id_str    = encode_uuid(order.event_id);
    let category_id_str = encode_uuid(order.category_id);
    let quantity        = i64::from(order.quantity);
    let unit_price      = order.unit_price;
    let total_amount    = order.total_amount;
    let currency        = order.currency.clone();
    let status_str      = encode_status(order.status);
    let method          = order.payment.method.clone();
    let reference       = order.payment.reference.clone();
    let metadata_str    = serde_json::to_string(&order.metadata)?;
    let now_str         = encode_dt(now);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let outcome = increment_sold(&tx, &category_id_str, quantity, Some(now_str.as_str()))?;
        if let Increment::Applied(_) = outcome {
          tx.execute(
            "INSERT INTO orders (
               order_id, customer_id, event_id, category_id, quantity,
               unit_price, total_amount, currency, status,
               payment_method, payment_reference, metadata, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            rusqlite::params![
              order_id_str,
              customer_id_str,
              event_id_str,
              category_id_str,
              quantity,
              unit_price,
              total_amount,
              currency,
              status_str,
              method,
              reference,
              metadata_str,
              now_str,
            ],
          )?;
          tx.commit()?;
        }
        // A rejected increment drops `tx`, rolling back.
        Ok(outcome)
      })
      .await?;

    match outcome {
      Increment::Applied(sold) => {
        tracing::debug!(
          order_id = %order.order_id,
          category_id = %order.category_id,
          sold,
          "order recorded"
        );
        Ok(order)
      }
      Increment::Rejected(raw) => Err(rejection(order.category_id, order.quantity, raw, Some(now))),
    }
  }

  async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawOrder> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = ?1"),
              rusqlite::params![id_str],
              RawOrder::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawOrder::into_order).transpose()
  }

  async fn list_orders(&self, event_id: Option<Uuid>) -> Result<Vec<Order>> {
    let event_str = event_id.map(encode_uuid);

    let raws: Vec<RawOrder> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ORDER_COLUMNS} FROM orders
           WHERE (?1 IS NULL OR event_id = ?1)
           ORDER BY created_at DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![event_str], RawOrder::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawOrder::into_order).collect()
  }

  // ── Credentials ───────────────────────────────────────────────────────────

  async fn record_credentials(
    &self,
    order_id:    Uuid,
    credentials: Vec<Credential>,
  ) -> Result<Vec<Credential>> {
    if let Some(stray) = credentials.iter().find(|c| c.order_id != order_id) {
      return Err(
        admit_core::Error::Validation(format!(
          "credential #{} belongs to order {}, not {order_id}",
          stray.sequence, stray.order_id
        ))
        .into(),
      );
    }

    let order_str = encode_uuid(order_id);
    let rows: Vec<(i64, String, String)> = credentials
      .into_iter()
      .map(|c| (i64::from(c.sequence), c.token, encode_dt(c.issued_at)))
      .collect();

    let stored: Option<Vec<RawCredential>> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists = tx
          .query_row(
            "SELECT 1 FROM orders WHERE order_id = ?1",
            rusqlite::params![order_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(None);
        }

        {
          let mut insert = tx.prepare(
            "INSERT OR IGNORE INTO credentials (order_id, sequence, token, issued_at)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          for (sequence, token, issued_at) in &rows {
            insert.execute(rusqlite::params![order_str, sequence, token, issued_at])?;
          }
        }

        let all = {
          let mut stmt = tx.prepare(
            "SELECT order_id, sequence, token, issued_at FROM credentials
             WHERE order_id = ?1 ORDER BY sequence",
          )?;
          let rows = stmt
            .query_map(rusqlite::params![order_str], RawCredential::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          rows
        };

        tx.commit()?;
        Ok(Some(all))
      })
      .await?;

    match stored {
      Some(raws) => raws.into_iter().map(RawCredential::into_credential).collect(),
      None => Err(admit_core::Error::OrderNotFound(order_id).into()),
    }
  }

  async fn get_credentials(&self, order_id: Uuid) -> Result<Vec<Credential>> {
    let order_str = encode_uuid(order_id);

    let raws: Vec<RawCredential> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT order_id, sequence, token, issued_at FROM credentials
           WHERE order_id = ?1 ORDER BY sequence",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![order_str], RawCredential::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCredential::into_credential).collect()
  }
}
