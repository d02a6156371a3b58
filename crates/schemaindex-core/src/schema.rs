//! Schemas and the reference items attached to them.
//!
//! A [`Schema`] is the registry entry; its [`SchemaRef`]s are the definition
//! files and its [`DocumentationItem`]s the supporting material (README,
//! license, RFCs). Child rows are replaced wholesale on every edit, diffed by
//! identity (see [`SchemaChangeset`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{format::FormatTag, permalink::PermanentUrl};

// ─── Schema ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
  pub schema_id:    Uuid,
  /// Human-readable name, e.g. "Docker Compose file".
  pub name:         String,
  pub created_by:   Uuid,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
  /// Set once when the schema is published.
  pub published_at: Option<DateTime<Utc>>,
}

impl Schema {
  /// Published iff `published_at` is set and not in the future relative to
  /// `now`.
  pub fn is_published_at(&self, now: DateTime<Utc>) -> bool {
    self.published_at.is_some_and(|at| at <= now)
  }

  pub fn is_published(&self) -> bool { self.is_published_at(Utc::now()) }
}

// ─── SchemaRef ───────────────────────────────────────────────────────────────

/// One definition file of a schema (a JSON Schema, a CDDL file, …).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRef {
  pub ref_id:     Uuid,
  pub schema_id:  Uuid,
  pub url:        String,
  pub name:       Option<String>,
  /// Format classified when the URL was last validated.
  pub format:     Option<FormatTag>,
  pub created_by: Uuid,
  pub created_at: DateTime<Utc>,
}

// ─── DocumentationItem ───────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DocumentationRole {
  Readme,
  License,
  Rfc,
  W3c,
}

impl DocumentationRole {
  /// Roles filled only through a submission's dedicated `readme` and
  /// `license` fields.
  pub fn is_slot(self) -> bool { matches!(self, Self::Readme | Self::License) }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DocumentationFormat {
  Markdown,
  PlainText,
}

impl DocumentationFormat {
  /// The documentation format corresponding to a classified tag, if any.
  pub fn from_tag(tag: FormatTag) -> Option<Self> {
    match tag {
      FormatTag::Markdown => Some(Self::Markdown),
      FormatTag::PlainText => Some(Self::PlainText),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationItem {
  pub item_id:     Uuid,
  pub schema_id:   Uuid,
  pub url:         String,
  pub name:        String,
  pub description: Option<String>,
  /// `None` for documentation without a specific role.
  pub role:        Option<DocumentationRole>,
  /// `None` for anything other than Markdown or plain text.
  pub format:      Option<DocumentationFormat>,
  pub created_by:  Uuid,
  pub created_at:  DateTime<Utc>,
}

// ─── Read model ──────────────────────────────────────────────────────────────

/// A schema together with everything attached to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDetail {
  pub schema:         Schema,
  /// Ordered by creation time.
  pub definitions:    Vec<SchemaRef>,
  /// Ordered by creation time.
  pub documentation:  Vec<DocumentationItem>,
  pub permanent_urls: Vec<PermanentUrl>,
}

impl SchemaDetail {
  /// The most recently created item with `role`; older ones are history.
  pub fn current(&self, role: DocumentationRole) -> Option<&DocumentationItem> {
    self
      .documentation
      .iter()
      .filter(|item| item.role == Some(role))
      .max_by_key(|item| item.created_at)
  }

  pub fn readme(&self) -> Option<&DocumentationItem> {
    self.current(DocumentationRole::Readme)
  }

  pub fn license(&self) -> Option<&DocumentationItem> {
    self.current(DocumentationRole::License)
  }

  pub fn definition(&self, ref_id: Uuid) -> Option<&SchemaRef> {
    self.definitions.iter().find(|r| r.ref_id == ref_id)
  }
}

// ─── Write model ─────────────────────────────────────────────────────────────

/// A definition row to keep (with `ref_id`) or create (without).
#[derive(Debug, Clone)]
pub struct RefChange {
  pub ref_id: Option<Uuid>,
  pub url:    String,
  pub name:   Option<String>,
  pub format: Option<FormatTag>,
}

/// A documentation row to keep (with `item_id`) or create (without).
#[derive(Debug, Clone)]
pub struct DocChange {
  pub item_id:     Option<Uuid>,
  pub url:         String,
  pub name:        String,
  pub description: Option<String>,
  pub role:        Option<DocumentationRole>,
  pub format:      Option<DocumentationFormat>,
}

/// Input to [`crate::store::RegistryStore::save_schema`].
///
/// Applied atomically: the schema row is inserted or updated, child rows
/// listed here are updated or created, and existing children missing from
/// the lists are deleted. When `publish_at` is set the schema is published in
/// the same transaction.
#[derive(Debug, Clone)]
pub struct SchemaChangeset {
  /// `None` creates a new schema.
  pub schema_id:     Option<Uuid>,
  pub name:          String,
  /// The acting user; must own the schema when `schema_id` is set.
  pub user_id:       Uuid,
  pub definitions:   Vec<RefChange>,
  pub documentation: Vec<DocChange>,
  pub publish_at:    Option<DateTime<Utc>>,
}
