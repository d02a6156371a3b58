//! Users, organizations and profiles.
//!
//! A user optionally belongs to one organization through their profile. The
//! organization's slug namespaces the permanent URLs its members mint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account. The password hash is kept by the store and never
/// leaves it through this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:    Uuid,
  pub username:   String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
  pub organization_id: Uuid,
  pub name:            String,
  /// URL-safe, globally unique; first path segment of permanent URLs.
  pub slug:            String,
  pub created_by:      Uuid,
  pub created_at:      DateTime<Utc>,
}

/// Input to [`crate::store::RegistryStore::add_organization`].
#[derive(Debug, Clone)]
pub struct NewOrganization {
  pub name:       String,
  pub slug:       String,
  pub created_by: Uuid,
}

/// Per-user settings. A user without a stored profile has the default one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub user_id:         Uuid,
  pub organization_id: Option<Uuid>,
}

impl Profile {
  pub fn empty(user_id: Uuid) -> Self { Self { user_id, organization_id: None } }
}
