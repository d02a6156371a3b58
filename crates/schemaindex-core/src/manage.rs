//! Registry workflows: creating, editing, publishing and deleting schemas,
//! and minting permanent URLs.
//!
//! Each workflow runs its policy checks first, then validates every URL field
//! (fetching each one once, in field order), and only then writes. A rejected
//! operation leaves storage untouched.

use chrono::Utc;
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use crate::{
  Error, Result,
  account::{NewOrganization, Organization, User},
  conflict::{Conflict, PublishedRef, collect_conflicts},
  fetch::UrlFetcher,
  format::FormatTag,
  permalink::{
    NewPermanentUrl, PermanentUrl, PermanentUrlTarget, build_permanent_url,
    validate_slug,
  },
  schema::{
    DocChange, DocumentationFormat, DocumentationRole, RefChange, Schema,
    SchemaChangeset, SchemaDetail,
  },
  store::RegistryStore,
  validate::{ConflictScope, FieldErrors, FieldKind, FieldPath, Validator},
};

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// A definition as submitted. `ref_id` identifies an existing row to keep.
#[derive(Debug, Clone, Deserialize)]
pub struct RefInput {
  #[serde(default)]
  pub ref_id: Option<Uuid>,
  pub url:    String,
  #[serde(default)]
  pub name:   Option<String>,
}

/// A documentation item as submitted. `item_id` identifies an existing row
/// to keep. `role` is ignored for the README and license slots, and may not
/// be `readme` or `license` in the free-form documentation list.
#[derive(Debug, Clone, Deserialize)]
pub struct DocInput {
  #[serde(default)]
  pub item_id:     Option<Uuid>,
  pub url:         String,
  #[serde(default)]
  pub name:        Option<String>,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub role:        Option<DocumentationRole>,
}

/// The full state of a schema as submitted by its author.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaSubmission {
  pub name:          String,
  pub definitions:   Vec<RefInput>,
  #[serde(default)]
  pub readme:        Option<DocInput>,
  #[serde(default)]
  pub license:       Option<DocInput>,
  #[serde(default)]
  pub documentation: Vec<DocInput>,
  /// Publish in the same step. Ignored for an already-published schema.
  #[serde(default)]
  pub publish:       bool,
}

// ─── Accounts ────────────────────────────────────────────────────────────────

/// Register a user. `password_hash` is produced by the caller.
pub async fn register_user<S>(
  store: &S,
  username: &str,
  password_hash: &str,
) -> Result<User>
where
  S: RegistryStore,
  Error: From<S::Error>,
{
  let username = username.trim();
  if username.is_empty() {
    return Err(Error::EmptyName);
  }
  let user = store.add_user(username, password_hash).await?;
  tracing::info!(user_id = %user.user_id, username, "user registered");
  Ok(user)
}

/// Create an organization and make `user_id` a member of it.
pub async fn create_organization<S>(
  store: &S,
  user_id: Uuid,
  name: &str,
  slug: &str,
) -> Result<Organization>
where
  S: RegistryStore,
  Error: From<S::Error>,
{
  let name = name.trim();
  if name.is_empty() {
    return Err(Error::EmptyName);
  }
  validate_slug(slug)?;

  let org = store
    .add_organization(NewOrganization {
      name:       name.to_owned(),
      slug:       slug.to_owned(),
      created_by: user_id,
    })
    .await?;
  store.set_user_organization(user_id, Some(org.organization_id)).await?;

  tracing::info!(organization_id = %org.organization_id, slug, "organization created");
  Ok(org)
}

// ─── Schemas ─────────────────────────────────────────────────────────────────

/// Load a schema and check that `user_id` owns it.
async fn owned_schema<S>(store: &S, user_id: Uuid, schema_id: Uuid) -> Result<Schema>
where
  S: RegistryStore,
  Error: From<S::Error>,
{
  let schema = store
    .get_schema(schema_id)
    .await?
    .ok_or(Error::SchemaNotFound(schema_id))?;
  if schema.created_by != user_id {
    return Err(Error::NotOwner(schema_id));
  }
  Ok(schema)
}

/// Create (`existing = None`) or replace a schema from a submission.
///
/// Every URL field is validated; all rejections are reported together as
/// [`Error::Invalid`]. Definition URLs are checked for conflicts when the
/// schema is, or is about to become, published.
pub async fn submit_schema<S, F>(
  store: &S,
  fetcher: &F,
  user_id: Uuid,
  existing: Option<Uuid>,
  submission: SchemaSubmission,
) -> Result<SchemaDetail>
where
  S: RegistryStore,
  F: UrlFetcher,
  Error: From<S::Error>,
{
  let name = submission.name.trim();
  if name.is_empty() {
    return Err(Error::EmptyName);
  }
  if submission.definitions.is_empty() {
    return Err(Error::NoDefinitions);
  }
  if let Some((index, role)) = submission
    .documentation
    .iter()
    .enumerate()
    .find_map(|(i, doc)| doc.role.filter(|r| r.is_slot()).map(|r| (i, r)))
  {
    return Err(Error::ReservedRole { index, role });
  }

  let already_published = match existing {
    Some(schema_id) => owned_schema(store, user_id, schema_id).await?.is_published(),
    None => false,
  };

  let snapshot = if already_published || submission.publish {
    Some(store.published_refs(existing).await?)
  } else {
    None
  };

  let mut validator = Validator::new(fetcher);
  if let Some(published) = &snapshot {
    validator = validator.with_conflict_scope(ConflictScope {
      owner_schema_id: existing,
      published,
    });
  }

  let mut errors = FieldErrors::default();

  let mut definitions = Vec::with_capacity(submission.definitions.len());
  for (i, input) in submission.definitions.iter().enumerate() {
    match validator.validate(&input.url, FieldKind::Definition).await {
      Ok(accepted) => definitions.push(RefChange {
        ref_id: input.ref_id,
        url:    accepted.url.into(),
        name:   input.name.clone(),
        format: Some(accepted.format),
      }),
      Err(rejection) => errors.push(FieldPath::Definition(i), rejection),
    }
  }

  let slots = [
    (&submission.readme, FieldPath::Readme, FieldKind::Readme, DocumentationRole::Readme),
    (&submission.license, FieldPath::License, FieldKind::License, DocumentationRole::License),
  ];

  let mut documentation = Vec::new();
  for (input, path, kind, role) in slots {
    let Some(input) = input else { continue };
    match validator.validate(&input.url, kind).await {
      Ok(accepted) => {
        documentation.push(doc_change(input, Some(role), accepted.url, accepted.format))
      }
      Err(rejection) => errors.push(path, rejection),
    }
  }

  for (i, input) in submission.documentation.iter().enumerate() {
    match validator.validate(&input.url, FieldKind::Documentation).await {
      Ok(accepted) => {
        documentation.push(doc_change(input, input.role, accepted.url, accepted.format))
      }
      Err(rejection) => errors.push(FieldPath::Documentation(i), rejection),
    }
  }

  if !errors.is_empty() {
    tracing::debug!(rejected = errors.len(), "submission rejected");
    return Err(Error::Invalid(errors));
  }

  let publish_at = (submission.publish && !already_published).then(Utc::now);
  let detail = store
    .save_schema(SchemaChangeset {
      schema_id: existing,
      name: name.to_owned(),
      user_id,
      definitions,
      documentation,
      publish_at,
    })
    .await?;

  tracing::info!(
    schema_id = %detail.schema.schema_id,
    created = existing.is_none(),
    published = publish_at.is_some(),
    "schema saved"
  );
  Ok(detail)
}

fn doc_change(
  input: &DocInput,
  role: Option<DocumentationRole>,
  url: Url,
  format: FormatTag,
) -> DocChange {
  let url = String::from(url);
  DocChange {
    item_id: input.item_id,
    name: input.name.clone().unwrap_or_else(|| url.clone()),
    url,
    description: input.description.clone(),
    role,
    format: DocumentationFormat::from_tag(format),
  }
}

/// Publish an existing schema without changing its contents.
///
/// Stored definitions are not fetched again; they are only checked against
/// the other published schemas. Every collision is reported.
pub async fn publish_schema<S>(store: &S, user_id: Uuid, schema_id: Uuid) -> Result<Schema>
where
  S: RegistryStore,
  Error: From<S::Error>,
{
  let detail = store
    .get_schema_detail(schema_id)
    .await?
    .ok_or(Error::SchemaNotFound(schema_id))?;
  if detail.schema.created_by != user_id {
    return Err(Error::NotOwner(schema_id));
  }
  if detail.schema.is_published() {
    return Err(Error::AlreadyPublished(schema_id));
  }
  if detail.definitions.is_empty() {
    return Err(Error::NoDefinitions);
  }

  let snapshot = store.published_refs(Some(schema_id)).await?;
  let conflicts = conflicts_for(&detail, &snapshot);
  if !conflicts.is_empty() {
    tracing::debug!(%schema_id, count = conflicts.len(), "publish refused");
    return Err(Error::PublishConflict(conflicts));
  }

  let schema = store.publish_schema(schema_id, user_id, Utc::now()).await?;
  tracing::info!(%schema_id, "schema published");
  Ok(schema)
}

/// Every (own definition, published definition) pair that collides.
pub fn conflicts_for(detail: &SchemaDetail, published: &[PublishedRef]) -> Vec<Conflict> {
  collect_conflicts(
    detail.definitions.iter().map(|r| r.url.as_str()),
    Some(detail.schema.schema_id),
    published,
  )
}

/// Delete an unpublished schema.
pub async fn delete_schema<S>(store: &S, user_id: Uuid, schema_id: Uuid) -> Result<()>
where
  S: RegistryStore,
  Error: From<S::Error>,
{
  let schema = owned_schema(store, user_id, schema_id).await?;
  if schema.is_published() {
    return Err(Error::CannotDeletePublished(schema_id));
  }
  store.delete_schema(schema_id, user_id).await?;
  tracing::info!(%schema_id, "schema deleted");
  Ok(())
}

/// The schema detail as seen by `viewer`. Unpublished schemas are visible
/// to their owner only and look missing to everyone else.
pub async fn visible_schema<S>(
  store: &S,
  viewer: Option<Uuid>,
  schema_id: Uuid,
) -> Result<SchemaDetail>
where
  S: RegistryStore,
  Error: From<S::Error>,
{
  let detail = store
    .get_schema_detail(schema_id)
    .await?
    .ok_or(Error::SchemaNotFound(schema_id))?;
  if detail.schema.is_published() || viewer == Some(detail.schema.created_by) {
    Ok(detail)
  } else {
    Err(Error::SchemaNotFound(schema_id))
  }
}

// ─── Permanent URLs ──────────────────────────────────────────────────────────

/// Mint `{site_url}/o/{org}/{slug}` pointing at a schema, or at one of its
/// definitions when `ref_id` is set.
pub async fn create_permanent_url<S>(
  store: &S,
  user_id: Uuid,
  site_url: &str,
  schema_id: Uuid,
  ref_id: Option<Uuid>,
  slug: &str,
) -> Result<PermanentUrl>
where
  S: RegistryStore,
  Error: From<S::Error>,
{
  validate_slug(slug)?;

  let organization_id = store
    .get_profile(user_id)
    .await?
    .organization_id
    .ok_or(Error::NoOrganization(user_id))?;
  let org = store
    .get_organization(organization_id)
    .await?
    .ok_or(Error::OrganizationNotFound(organization_id))?;

  owned_schema(store, user_id, schema_id).await?;
  let target = match ref_id {
    Some(ref_id) => {
      let schema_ref = store
        .get_schema_ref(ref_id)
        .await?
        .filter(|r| r.schema_id == schema_id)
        .ok_or(Error::SchemaRefNotFound(ref_id))?;
      PermanentUrlTarget::SchemaRef(schema_ref.ref_id)
    }
    None => PermanentUrlTarget::Schema(schema_id),
  };

  let url = build_permanent_url(site_url, &org.slug, slug);
  if store.resolve_permanent_url(&url).await?.is_some() {
    return Err(Error::PermanentUrlTaken(url));
  }

  let link = store
    .add_permanent_url(NewPermanentUrl { url, schema_id, target, created_by: user_id })
    .await?;
  tracing::info!(url = %link.url, ?target, "permanent URL created");
  Ok(link)
}

/// Find the permanent URL served at `/o/{org_slug}/{slug}`.
pub async fn resolve_permanent_url<S>(
  store: &S,
  site_url: &str,
  org_slug: &str,
  slug: &str,
) -> Result<PermanentUrl>
where
  S: RegistryStore,
  Error: From<S::Error>,
{
  let url = build_permanent_url(site_url, org_slug, slug);
  store
    .resolve_permanent_url(&url)
    .await?
    .ok_or(Error::PermanentUrlNotFound(url))
}
