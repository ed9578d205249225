//! SQL schema for the Admit SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Timestamps are fixed-width RFC 3339 UTC strings (nanosecond precision,
/// `Z` suffix), so string comparison orders them chronologically.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS events (
    event_id    TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    venue       TEXT,
    starts_at   TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

-- `sold` is only ever changed by a conditional `sold = sold + ?` update.
CREATE TABLE IF NOT EXISTS ticket_categories (
    category_id TEXT PRIMARY KEY,
    event_id    TEXT NOT NULL REFERENCES events(event_id),
    name        TEXT NOT NULL,
    unit_price  INTEGER NOT NULL CHECK (unit_price >= 0),
    currency    TEXT NOT NULL,
    total       INTEGER NOT NULL CHECK (total >= 0),
    sold        INTEGER NOT NULL DEFAULT 0,
    sales_start TEXT,
    sales_end   TEXT,
    CHECK (sold >= 0 AND sold <= total)
);

CREATE TABLE IF NOT EXISTS customers (
    customer_id TEXT PRIMARY KEY,
    email       TEXT NOT NULL UNIQUE,  -- trimmed + lower-cased
    name        TEXT NOT NULL,
    phone       TEXT,
    company     TEXT,
    job_title   TEXT,
    role        TEXT NOT NULL DEFAULT 'attendee',
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

-- Orders are never updated after insert.
CREATE TABLE IF NOT EXISTS orders (
    order_id          TEXT PRIMARY KEY,
    customer_id       TEXT NOT NULL REFERENCES customers(customer_id),
    event_id          TEXT NOT NULL REFERENCES events(event_id),
    category_id       TEXT NOT NULL REFERENCES ticket_categories(category_id),
    quantity          INTEGER NOT NULL CHECK (quantity >= 1),
    unit_price        INTEGER NOT NULL,
    total_amount      INTEGER NOT NULL,
    currency          TEXT NOT NULL,
    status            TEXT NOT NULL,
    payment_method    TEXT NOT NULL,
    payment_reference TEXT NOT NULL,
    metadata          TEXT NOT NULL DEFAULT 'null',
    created_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS credentials (
    order_id   TEXT NOT NULL REFERENCES orders(order_id) ON DELETE CASCADE,
    sequence   INTEGER NOT NULL CHECK (sequence >= 1),
    token      TEXT NOT NULL,
    issued_at  TEXT NOT NULL,
    PRIMARY KEY (order_id, sequence)
);

CREATE INDEX IF NOT EXISTS categories_event_idx ON ticket_categories(event_id);
CREATE INDEX IF NOT EXISTS orders_event_idx     ON orders(event_id);
CREATE INDEX IF NOT EXISTS orders_customer_idx  ON orders(customer_id);
CREATE INDEX IF NOT EXISTS orders_created_idx   ON orders(created_at);

PRAGMA user_version = 1;
";
