//! Core types and trait definitions for the Admit ticketing service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::TicketStore`]; notification providers
//! implement [`notify::NotificationBackend`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod broadcast;
pub mod credential;
pub mod customer;
pub mod error;
pub mod event;
pub mod identity;
pub mod inventory;
pub mod notify;
pub mod order;
pub mod store;

pub use error::{Availability, Error, Result};
