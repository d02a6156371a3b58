//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed microsecond
//! precision and a `Z` suffix, so string comparison in SQL orders them
//! chronologically. UUIDs are stored as hyphenated lowercase strings; enum
//! columns hold their lowercase `Display` form.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use schemaindex_core::{
  account::{Organization, Profile, User},
  conflict::PublishedRef,
  format::FormatTag,
  permalink::{PermanentUrl, PermanentUrlTarget},
  schema::{DocumentationFormat, DocumentationItem, DocumentationRole, Schema, SchemaRef},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

/// Parse a strum-backed enum column.
fn decode_enum<T: FromStr>(column: &'static str, value: Option<String>) -> Result<Option<T>> {
  value
    .map(|v| T::from_str(&v).map_err(|_| Error::Decode { column, value: v }))
    .transpose()
}

// ─── Permanent URL targets ───────────────────────────────────────────────────

pub const TARGET_SCHEMA: &str = "schema";
pub const TARGET_SCHEMA_REF: &str = "schema_ref";

pub fn encode_target(target: PermanentUrlTarget) -> (&'static str, String) {
  match target {
    PermanentUrlTarget::Schema(id) => (TARGET_SCHEMA, encode_uuid(id)),
    PermanentUrlTarget::SchemaRef(id) => (TARGET_SCHEMA_REF, encode_uuid(id)),
  }
}

fn decode_target(kind: &str, id: &str) -> Result<PermanentUrlTarget> {
  let id = decode_uuid(id)?;
  match kind {
    TARGET_SCHEMA => Ok(PermanentUrlTarget::Schema(id)),
    TARGET_SCHEMA_REF => Ok(PermanentUrlTarget::SchemaRef(id)),
    other => Err(Error::Decode { column: "target_kind", value: other.to_owned() }),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:    String,
  pub username:   String,
  pub created_at: String,
}

impl RawUser {
  pub const COLUMNS: &'static str = "user_id, username, created_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(0)?,
      username:   row.get(1)?,
      created_at: row.get(2)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    decode_uuid(&self.user_id)?,
      username:   self.username,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawOrganization {
  pub organization_id: String,
  pub name:            String,
  pub slug:            String,
  pub created_by:      String,
  pub created_at:      String,
}

impl RawOrganization {
  pub const COLUMNS: &'static str = "organization_id, name, slug, created_by, created_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      organization_id: row.get(0)?,
      name:            row.get(1)?,
      slug:            row.get(2)?,
      created_by:      row.get(3)?,
      created_at:      row.get(4)?,
    })
  }

  pub fn into_organization(self) -> Result<Organization> {
    Ok(Organization {
      organization_id: decode_uuid(&self.organization_id)?,
      name:            self.name,
      slug:            self.slug,
      created_by:      decode_uuid(&self.created_by)?,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawProfile {
  pub user_id:         String,
  pub organization_id: Option<String>,
}

impl RawProfile {
  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      user_id:         decode_uuid(&self.user_id)?,
      organization_id: self.organization_id.as_deref().map(decode_uuid).transpose()?,
    })
  }
}

/// Raw strings read directly from a `schemas` row.
pub struct RawSchema {
  pub schema_id:    String,
  pub name:         String,
  pub created_by:   String,
  pub created_at:   String,
  pub updated_at:   String,
  pub published_at: Option<String>,
}

impl RawSchema {
  pub const COLUMNS: &'static str =
    "s.schema_id, s.name, s.created_by, s.created_at, s.updated_at, s.published_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      schema_id:    row.get(0)?,
      name:         row.get(1)?,
      created_by:   row.get(2)?,
      created_at:   row.get(3)?,
      updated_at:   row.get(4)?,
      published_at: row.get(5)?,
    })
  }

  pub fn into_schema(self) -> Result<Schema> {
    Ok(Schema {
      schema_id:    decode_uuid(&self.schema_id)?,
      name:         self.name,
      created_by:   decode_uuid(&self.created_by)?,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
      published_at: decode_opt_dt(self.published_at)?,
    })
  }
}

pub struct RawSchemaRef {
  pub ref_id:     String,
  pub schema_id:  String,
  pub url:        String,
  pub name:       Option<String>,
  pub format:     Option<String>,
  pub created_by: String,
  pub created_at: String,
}

impl RawSchemaRef {
  pub const COLUMNS: &'static str = "ref_id, schema_id, url, name, format, created_by, created_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      ref_id:     row.get(0)?,
      schema_id:  row.get(1)?,
      url:        row.get(2)?,
      name:       row.get(3)?,
      format:     row.get(4)?,
      created_by: row.get(5)?,
      created_at: row.get(6)?,
    })
  }

  pub fn into_schema_ref(self) -> Result<SchemaRef> {
    Ok(SchemaRef {
      ref_id:     decode_uuid(&self.ref_id)?,
      schema_id:  decode_uuid(&self.schema_id)?,
      url:        self.url,
      name:       self.name,
      format:     decode_enum::<FormatTag>("format", self.format)?,
      created_by: decode_uuid(&self.created_by)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawDocumentationItem {
  pub item_id:     String,
  pub schema_id:   String,
  pub url:         String,
  pub name:        String,
  pub description: Option<String>,
  pub role:        Option<String>,
  pub format:      Option<String>,
  pub created_by:  String,
  pub created_at:  String,
}

impl RawDocumentationItem {
  pub const COLUMNS: &'static str =
    "item_id, schema_id, url, name, description, role, format, created_by, created_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      item_id:     row.get(0)?,
      schema_id:   row.get(1)?,
      url:         row.get(2)?,
      name:        row.get(3)?,
      description: row.get(4)?,
      role:        row.get(5)?,
      format:      row.get(6)?,
      created_by:  row.get(7)?,
      created_at:  row.get(8)?,
    })
  }

  pub fn into_item(self) -> Result<DocumentationItem> {
    Ok(DocumentationItem {
      item_id:     decode_uuid(&self.item_id)?,
      schema_id:   decode_uuid(&self.schema_id)?,
      url:         self.url,
      name:        self.name,
      description: self.description,
      role:        decode_enum::<DocumentationRole>("role", self.role)?,
      format:      decode_enum::<DocumentationFormat>("format", self.format)?,
      created_by:  decode_uuid(&self.created_by)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawPermanentUrl {
  pub permanent_url_id: String,
  pub url:              String,
  pub schema_id:        String,
  pub target_kind:      String,
  pub target_id:        String,
  pub created_by:       String,
  pub created_at:       String,
}

impl RawPermanentUrl {
  pub const COLUMNS: &'static str =
    "permanent_url_id, url, schema_id, target_kind, target_id, created_by, created_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      permanent_url_id: row.get(0)?,
      url:              row.get(1)?,
      schema_id:        row.get(2)?,
      target_kind:      row.get(3)?,
      target_id:        row.get(4)?,
      created_by:       row.get(5)?,
      created_at:       row.get(6)?,
    })
  }

  pub fn into_permanent_url(self) -> Result<PermanentUrl> {
    Ok(PermanentUrl {
      permanent_url_id: decode_uuid(&self.permanent_url_id)?,
      url:              self.url,
      schema_id:        decode_uuid(&self.schema_id)?,
      target:           decode_target(&self.target_kind, &self.target_id)?,
      created_by:       decode_uuid(&self.created_by)?,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

/// A definition row joined with its published schema.
pub struct RawPublishedRef {
  pub ref_id:      String,
  pub schema_id:   String,
  pub schema_name: String,
  pub url:         String,
}

impl RawPublishedRef {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      ref_id:      row.get(0)?,
      schema_id:   row.get(1)?,
      schema_name: row.get(2)?,
      url:         row.get(3)?,
    })
  }

  pub fn into_published(self) -> Result<PublishedRef> {
    Ok(PublishedRef {
      ref_id:      decode_uuid(&self.ref_id)?,
      schema_id:   decode_uuid(&self.schema_id)?,
      schema_name: self.schema_name,
      url:         self.url,
    })
  }
}
