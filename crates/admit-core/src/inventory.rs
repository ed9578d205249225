//! Inventory rules for ticket categories.
//!
//! [`check_availability`] is the early, user-facing rejection. It is not
//! authoritative: two requests can both pass it for the last unit. The store's
//! conditional increment re-validates `sold + qty <= total` at write time and
//! is the only thing that actually guards the invariant.

use chrono::{DateTime, Utc};

use crate::{error::Availability, event::TicketCategory};

/// Whether `now` falls inside the category's sale window, if it has one.
pub fn check_sale_window(
  category: &TicketCategory,
  now: DateTime<Utc>,
) -> Result<(), Availability> {
  if let Some(starts_at) = category.sales_start
    && now < starts_at
  {
    return Err(Availability::SalesNotStarted { starts_at });
  }
  if let Some(ended_at) = category.sales_end
    && now > ended_at
  {
    return Err(Availability::SalesEnded { ended_at });
  }
  Ok(())
}

/// Check that `requested` units of `category` can be sold at `now`.
pub fn check_availability(
  category: &TicketCategory,
  requested: u32,
  now: DateTime<Utc>,
) -> Result<(), Availability> {
  check_sale_window(category, now)?;

  let available = category.available();
  if requested > available {
    return Err(Availability::OutOfStock { requested, available });
  }
  Ok(())
}

/// `true` if the category is inside its sale window and not sold out.
pub fn on_sale(category: &TicketCategory, now: DateTime<Utc>) -> bool {
  check_availability(category, 1, now).is_ok()
}
