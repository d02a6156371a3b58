//! Error types for `schemaindex-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::{conflict::Conflict, schema::DocumentationRole, validate::FieldErrors};

#[derive(Debug, Error)]
pub enum Error {
  /// One or more URL fields were rejected.
  #[error("invalid submission: {0}")]
  Invalid(FieldErrors),

  #[error("A schema must have at least one definition")]
  NoDefinitions,

  #[error("schema name must not be empty")]
  EmptyName,

  /// README and license have dedicated fields with their own allowlists.
  #[error("documentation[{index}] cannot take the {role} role; use the {role} field")]
  ReservedRole { index: usize, role: DocumentationRole },

  #[error("schema {0} is not owned by the requesting user")]
  NotOwner(Uuid),

  #[error("schema {0} is already published")]
  AlreadyPublished(Uuid),

  #[error("schema {0} is published and cannot be deleted")]
  CannotDeletePublished(Uuid),

  /// Definitions collide with already-published ones.
  #[error("{} definition URL(s) are already in use by another Schema", .0.len())]
  PublishConflict(Vec<Conflict>),

  #[error("user {0} does not belong to an organization")]
  NoOrganization(Uuid),

  #[error("invalid slug {0:?}: use lowercase letters, digits and '-'")]
  InvalidSlug(String),

  #[error("permanent URL {0} is already taken")]
  PermanentUrlTaken(String),

  #[error("username {0:?} is already taken")]
  UsernameTaken(String),

  #[error("organization slug {0:?} is already taken")]
  OrganizationSlugTaken(String),

  #[error("schema not found: {0}")]
  SchemaNotFound(Uuid),

  #[error("definition not found: {0}")]
  SchemaRefNotFound(Uuid),

  #[error("documentation item not found: {0}")]
  DocumentationItemNotFound(Uuid),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("organization not found: {0}")]
  OrganizationNotFound(Uuid),

  #[error("permanent URL not found: {0}")]
  PermanentUrlNotFound(String),

  /// An unexpected storage backend failure.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::SchemaNotFound(_)
        | Self::SchemaRefNotFound(_)
        | Self::DocumentationItemNotFound(_)
        | Self::UserNotFound(_)
        | Self::OrganizationNotFound(_)
        | Self::PermanentUrlNotFound(_)
    )
  }
}

impl From<FieldErrors> for Error {
  fn from(errors: FieldErrors) -> Self { Self::Invalid(errors) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
