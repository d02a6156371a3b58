//! The `RegistryStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `schemaindex-store-sqlite`). The workflows in [`crate::manage`] and the
//! HTTP layer depend on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  account::{NewOrganization, Organization, Profile, User},
  conflict::PublishedRef,
  format::FormatTag,
  permalink::{NewPermanentUrl, PermanentUrl},
  schema::{Schema, SchemaChangeset, SchemaDetail, SchemaRef},
};

/// Page size used when a query does not set one.
pub const DEFAULT_LIMIT: usize = 100;

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`RegistryStore::list_public_schemas`].
#[derive(Debug, Clone, Default)]
pub struct SchemaQuery {
  /// Case-insensitive substring match on the schema name.
  pub text:            Option<String>,
  /// Restrict to schemas created by members of this organization.
  pub organization_id: Option<Uuid>,
  /// Restrict to schemas with at least one definition in this format.
  pub format:          Option<FormatTag>,
  pub limit:           Option<usize>,
  pub offset:          Option<usize>,
}

impl SchemaQuery {
  pub fn limit(&self) -> usize { self.limit.unwrap_or(DEFAULT_LIMIT) }

  pub fn offset(&self) -> usize { self.offset.unwrap_or(0) }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a registry storage backend.
///
/// Write methods enforce the registry's policies inside their own
/// transaction (ownership, publish-once, definition uniqueness among
/// published schemas) and report violations as
/// [`crate::Error`] variants through `Self::Error`. Callers run the same
/// checks beforehand to give early, aggregated feedback; the store's copy is
/// the one that holds under concurrency.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RegistryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Accounts ──────────────────────────────────────────────────────────

  /// Create a user with an already-hashed password.
  fn add_user<'a>(
    &'a self,
    username: &'a str,
    password_hash: &'a str,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + 'a;

  fn get_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// The user and their stored password hash, for authentication.
  fn find_user_credentials<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<(User, String)>, Self::Error>> + Send + 'a;

  fn add_organization(
    &self,
    input: NewOrganization,
  ) -> impl Future<Output = Result<Organization, Self::Error>> + Send + '_;

  fn get_organization(
    &self,
    organization_id: Uuid,
  ) -> impl Future<Output = Result<Option<Organization>, Self::Error>> + Send + '_;

  /// Create or update the user's profile.
  fn set_user_organization(
    &self,
    user_id: Uuid,
    organization_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  /// The stored profile, or [`Profile::empty`] if none exists yet.
  fn get_profile(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  // ── Schemas: reads ────────────────────────────────────────────────────

  fn get_schema(
    &self,
    schema_id: Uuid,
  ) -> impl Future<Output = Result<Option<Schema>, Self::Error>> + Send + '_;

  /// The schema with its definitions, documentation and permanent URLs.
  fn get_schema_detail(
    &self,
    schema_id: Uuid,
  ) -> impl Future<Output = Result<Option<SchemaDetail>, Self::Error>> + Send + '_;

  fn get_schema_ref(
    &self,
    ref_id: Uuid,
  ) -> impl Future<Output = Result<Option<SchemaRef>, Self::Error>> + Send + '_;

  /// Published schemas with at least one definition, ordered by name.
  fn list_public_schemas<'a>(
    &'a self,
    query: &'a SchemaQuery,
  ) -> impl Future<Output = Result<Vec<Schema>, Self::Error>> + Send + 'a;

  /// Every schema created by `user_id`, published or not, ordered by name.
  fn list_schemas_by_owner(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Schema>, Self::Error>> + Send + '_;

  /// Definition URLs of every published schema, except those of
  /// `excluding`. This is the snapshot conflict detection runs against.
  fn published_refs(
    &self,
    excluding: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<PublishedRef>, Self::Error>> + Send + '_;

  // ── Schemas: writes ───────────────────────────────────────────────────

  /// Apply a [`SchemaChangeset`] atomically and return the resulting detail.
  fn save_schema(
    &self,
    changeset: SchemaChangeset,
  ) -> impl Future<Output = Result<SchemaDetail, Self::Error>> + Send + '_;

  /// Mark an unpublished schema as published at `at`.
  fn publish_schema(
    &self,
    schema_id: Uuid,
    user_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Schema, Self::Error>> + Send + '_;

  /// Delete an unpublished schema and everything attached to it.
  fn delete_schema(
    &self,
    schema_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Permanent URLs ────────────────────────────────────────────────────

  fn add_permanent_url(
    &self,
    input: NewPermanentUrl,
  ) -> impl Future<Output = Result<PermanentUrl, Self::Error>> + Send + '_;

  fn list_permanent_urls(
    &self,
    schema_id: Uuid,
  ) -> impl Future<Output = Result<Vec<PermanentUrl>, Self::Error>> + Send + '_;

  /// Look up a permanent URL by its full absolute URL.
  fn resolve_permanent_url<'a>(
    &'a self,
    url: &'a str,
  ) -> impl Future<Output = Result<Option<PermanentUrl>, Self::Error>> + Send + 'a;
}
