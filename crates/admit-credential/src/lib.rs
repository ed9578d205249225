//! Credential issuance for Admit.
//!
//! Turns an [`Order`] into one signed, scannable credential per purchased
//! unit. Pure synchronous; no HTTP or database dependencies. The only side
//! input is the issuance timestamp passed in by the caller.
//!
//! # Quick start
//!
//! ```no_run
//! use admit_credential::CredentialIssuer;
//! # fn demo(order: &admit_core::order::Order) -> admit_credential::Result<()> {
//! let issuer = CredentialIssuer::new("a long random secret")?;
//! for issued in issuer.issue_rendered(order, chrono::Utc::now())? {
//!   println!("#{} {}", issued.credential.sequence, issued.rendering.png_data_url);
//! }
//! # Ok(()) }
//! ```

pub mod error;
mod render;
mod token;

use std::collections::BTreeSet;

use admit_core::{
  credential::{Credential, CredentialPayload},
  order::Order,
};
use chrono::{DateTime, Utc};

pub use error::{Error, Result};
pub use render::{Rendering, render};

// ─── Public types
// ─────────────────────────────────────────────────────────────

/// A credential together with its rendered forms.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
  pub credential: Credential,
  pub rendering:  Rendering,
}

/// Signs and verifies credential tokens with a shared secret.
#[derive(Clone)]
pub struct CredentialIssuer {
  key: Vec<u8>,
}

impl std::fmt::Debug for CredentialIssuer {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CredentialIssuer").finish_non_exhaustive()
  }
}

// ─── Public API
// ───────────────────────────────────────────────────────────────

impl CredentialIssuer {
  pub fn new(secret: impl AsRef<[u8]>) -> Result<Self> {
    let key = secret.as_ref().to_vec();
    if key.is_empty() {
      return Err(Error::EmptySecret);
    }
    Ok(Self { key })
  }

  /// The claims for unit `sequence` of `order`.
  pub fn payload(order: &Order, sequence: u32, issued_at: DateTime<Utc>) -> CredentialPayload {
    CredentialPayload {
      order_id: order.order_id,
      customer_id: order.customer_id,
      category_id: order.category_id,
      event_id: order.event_id,
      sequence,
      issued_at,
    }
  }

  fn sign_one(&self, order: &Order, sequence: u32, now: DateTime<Utc>) -> Result<Credential> {
    let payload = Self::payload(order, sequence, now);
    Ok(Credential {
      order_id: order.order_id,
      sequence,
      token: token::sign(&self.key, &payload)?,
      issued_at: now,
    })
  }

  /// Sign exactly `order.quantity` credentials, sequences `1..=quantity`.
  pub fn issue(&self, order: &Order, now: DateTime<Utc>) -> Result<Vec<Credential>> {
    (1..=order.quantity)
      .map(|sequence| self.sign_one(order, sequence, now))
      .collect()
  }

  /// Sign only the sequences of `order` not already present in `existing`.
  ///
  /// Used to resume issuance for an order whose credentials were never (or
  /// only partly) stored.
  pub fn issue_missing(
    &self,
    order: &Order,
    existing: &[Credential],
    now: DateTime<Utc>,
  ) -> Result<Vec<Credential>> {
    let present: BTreeSet<u32> = existing.iter().map(|c| c.sequence).collect();
    (1..=order.quantity)
      .filter(|sequence| !present.contains(sequence))
      .map(|sequence| self.sign_one(order, sequence, now))
      .collect()
  }

  /// [`issue`](Self::issue), then render every credential.
  ///
  /// Fails as a whole if any token cannot be rendered.
  pub fn issue_rendered(&self, order: &Order, now: DateTime<Utc>) -> Result<Vec<IssuedCredential>> {
    self
      .issue(order, now)?
      .into_iter()
      .map(|credential| {
        let rendering = render(&credential.token)?;
        Ok(IssuedCredential { credential, rendering })
      })
      .collect()
  }

  /// Check a token's signature and decode its claims.
  pub fn verify(&self, token: &str) -> Result<CredentialPayload> { token::verify(&self.key, token) }
}
