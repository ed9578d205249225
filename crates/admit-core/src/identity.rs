//! Identity resolution: find-or-create a customer from submitted contact
//! details.
//!
//! Email addresses are trimmed and ASCII-lower-cased before lookup, so
//! `Alice@Example.com ` and `alice@example.com` resolve to the same customer.

use serde::Deserialize;

use crate::{
  Error, Result,
  customer::{Customer, CustomerProfile},
  store::TicketStore,
};

/// Contact details as submitted with a purchase.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactDetails {
  #[serde(default)]
  pub name:      String,
  #[serde(default)]
  pub email:     String,
  pub phone:     Option<String>,
  pub company:   Option<String>,
  pub job_title: Option<String>,
}

/// Trim and lower-case an email address and check its basic shape.
pub fn normalize_email(raw: &str) -> Result<String> {
  let email = raw.trim().to_ascii_lowercase();
  if email.is_empty() {
    return Err(Error::Validation("customer.email is required".into()));
  }

  let valid = match email.split_once('@') {
    Some((local, domain)) => {
      !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
    }
    None => false,
  };

  if !valid {
    return Err(Error::Validation(format!("malformed email address: {raw:?}")));
  }
  Ok(email)
}

fn non_blank(field: &Option<String>) -> Option<String> {
  field
    .as_deref()
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_owned)
}

/// Validate submitted contact details and turn them into a store profile.
pub fn normalize(details: &ContactDetails) -> Result<CustomerProfile> {
  let email = normalize_email(&details.email)?;
  let name = details.name.trim();
  if name.is_empty() {
    return Err(Error::Validation("customer.name is required".into()));
  }

  Ok(CustomerProfile {
    email,
    name: name.to_owned(),
    phone: non_blank(&details.phone),
    company: non_blank(&details.company),
    job_title: non_blank(&details.job_title),
  })
}

/// Find the customer for `profile.email`, creating it if absent and merging
/// supplied fields if present.
///
/// Only storage failures are possible here; they surface as
/// [`Error::Persistence`] (or whatever the store maps them to).
pub async fn resolve<S>(store: &S, profile: CustomerProfile) -> Result<Customer>
where
  S: TicketStore,
  S::Error: Into<Error>,
{
  let customer = store.upsert_customer(profile).await.map_err(Into::into)?;
  tracing::debug!(customer_id = %customer.customer_id, "customer resolved");
  Ok(customer)
}
