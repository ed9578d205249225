//! Customers, the people tickets are sold to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  #[default]
  Attendee,
  Staff,
}

/// A customer, identified by a unique normalized email address.
///
/// Contact fields are overwritten in place by later purchases; no history is
/// kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
  pub customer_id: Uuid,
  pub email:       String,
  pub name:        String,
  pub phone:       Option<String>,
  pub company:     Option<String>,
  pub job_title:   Option<String>,
  pub role:        Role,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// Normalized profile handed to the store's upsert.
///
/// Produced by [`identity::normalize`](crate::identity::normalize): the email
/// is trimmed and lower-cased, optional fields are trimmed and `None` when
/// blank. `None` means "leave the stored value alone".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerProfile {
  pub email:     String,
  pub name:      String,
  pub phone:     Option<String>,
  pub company:   Option<String>,
  pub job_title: Option<String>,
}
