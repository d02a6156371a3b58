//! [`SqliteStore`]: the SQLite implementation of [`RegistryStore`].

use std::{collections::HashSet, path::Path};

use chrono::{DateTime, SubsecRound as _, Utc};
use rusqlite::{Connection, OptionalExtension as _};
use uuid::Uuid;

use schemaindex_core::{
  Error as CoreError,
  account::{NewOrganization, Organization, Profile, User},
  conflict::{PublishedRef, collect_conflicts},
  permalink::{NewPermanentUrl, PermanentUrl},
  schema::{Schema, SchemaChangeset, SchemaDetail, SchemaRef},
  store::{RegistryStore, SchemaQuery},
};

use crate::{
  Result,
  encode::{
    RawDocumentationItem, RawOrganization, RawPermanentUrl, RawProfile,
    RawPublishedRef, RawSchema, RawSchemaRef, RawUser, TARGET_SCHEMA_REF, encode_dt,
    encode_target, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A registry store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection handle is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` on the database thread. `f` reports both SQL failures and
  /// policy violations through the crate's [`Result`].
  async fn with_conn<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }
}

// ─── Synchronous helpers (run on the database thread) ────────────────────────

/// The current time at the precision timestamps are stored with.
fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _)
      if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

/// Map a UNIQUE violation on insert to the given policy error.
fn insert_unique(
  conn: &Connection,
  sql: &str,
  params: impl rusqlite::Params,
  taken: impl FnOnce() -> CoreError,
) -> Result<()> {
  match conn.execute(sql, params) {
    Ok(_) => Ok(()),
    Err(e) if is_unique_violation(&e) => Err(taken().into()),
    Err(e) => Err(e.into()),
  }
}

fn load_schema(conn: &Connection, schema_id: Uuid) -> Result<Option<Schema>> {
  conn
    .query_row(
      &format!("SELECT {} FROM schemas s WHERE s.schema_id = ?1", RawSchema::COLUMNS),
      rusqlite::params![encode_uuid(schema_id)],
      RawSchema::from_row,
    )
    .optional()?
    .map(RawSchema::into_schema)
    .transpose()
}

/// Load a schema for writing on behalf of `user_id`.
fn load_owned(conn: &Connection, schema_id: Uuid, user_id: Uuid) -> Result<Schema> {
  let schema =
    load_schema(conn, schema_id)?.ok_or(CoreError::SchemaNotFound(schema_id))?;
  if schema.created_by != user_id {
    return Err(CoreError::NotOwner(schema_id).into());
  }
  Ok(schema)
}

fn load_published_refs(
  conn: &Connection,
  excluding: Option<Uuid>,
  now: DateTime<Utc>,
) -> Result<Vec<PublishedRef>> {
  let mut stmt = conn.prepare(
    "SELECT r.ref_id, r.schema_id, s.name, r.url
     FROM schema_refs r
     JOIN schemas s ON s.schema_id = r.schema_id
     WHERE s.published_at IS NOT NULL
       AND s.published_at <= ?1
       AND (?2 IS NULL OR s.schema_id != ?2)
     ORDER BY s.name, r.created_at",
  )?;
  let raws = stmt
    .query_map(
      rusqlite::params![encode_dt(now), excluding.map(encode_uuid)],
      RawPublishedRef::from_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawPublishedRef::into_published).collect()
}

/// Refuse `urls` if any collides with another published schema.
fn ensure_no_conflicts<'u>(
  conn: &Connection,
  schema_id: Uuid,
  urls: impl IntoIterator<Item = &'u str>,
  now: DateTime<Utc>,
) -> Result<()> {
  let snapshot = load_published_refs(conn, Some(schema_id), now)?;
  let conflicts = collect_conflicts(urls, Some(schema_id), &snapshot);
  if conflicts.is_empty() {
    Ok(())
  } else {
    Err(CoreError::PublishConflict(conflicts).into())
  }
}

fn child_ids(conn: &Connection, sql: &str, schema_id: &str) -> Result<HashSet<String>> {
  let mut stmt = conn.prepare(sql)?;
  let ids = stmt
    .query_map(rusqlite::params![schema_id], |row| row.get(0))?
    .collect::<rusqlite::Result<HashSet<String>>>()?;
  Ok(ids)
}

fn query_list<T, R>(
  conn: &Connection,
  sql: &str,
  params: impl rusqlite::Params,
  from_row: fn(&rusqlite::Row<'_>) -> rusqlite::Result<R>,
  decode: fn(R) -> Result<T>,
) -> Result<Vec<T>> {
  let mut stmt = conn.prepare(sql)?;
  let raws = stmt
    .query_map(params, from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(decode).collect()
}

fn load_detail(conn: &Connection, schema_id: Uuid) -> Result<Option<SchemaDetail>> {
  let Some(schema) = load_schema(conn, schema_id)? else {
    return Ok(None);
  };
  let id = encode_uuid(schema_id);

  let definitions = query_list(
    conn,
    &format!(
      "SELECT {} FROM schema_refs WHERE schema_id = ?1 ORDER BY created_at, rowid",
      RawSchemaRef::COLUMNS
    ),
    rusqlite::params![id],
    RawSchemaRef::from_row,
    RawSchemaRef::into_schema_ref,
  )?;
  let documentation = query_list(
    conn,
    &format!(
      "SELECT {} FROM documentation_items WHERE schema_id = ?1 ORDER BY created_at, rowid",
      RawDocumentationItem::COLUMNS
    ),
    rusqlite::params![id],
    RawDocumentationItem::from_row,
    RawDocumentationItem::into_item,
  )?;
  let permanent_urls = query_list(
    conn,
    &format!(
      "SELECT {} FROM permanent_urls WHERE schema_id = ?1 ORDER BY created_at, rowid",
      RawPermanentUrl::COLUMNS
    ),
    rusqlite::params![id],
    RawPermanentUrl::from_row,
    RawPermanentUrl::into_permanent_url,
  )?;

  Ok(Some(SchemaDetail { schema, definitions, documentation, permanent_urls }))
}

/// Apply a changeset inside one transaction and return the schema id.
fn save_changeset(
  conn: &mut Connection,
  cs: SchemaChangeset,
  now: DateTime<Utc>,
) -> Result<Uuid> {
  let tx = conn.transaction()?;

  let (schema_id, published) = match cs.schema_id {
    Some(id) => (id, load_owned(&tx, id, cs.user_id)?.is_published_at(now)),
    None => (Uuid::new_v4(), false),
  };
  if cs.definitions.is_empty() {
    return Err(CoreError::NoDefinitions.into());
  }
  if published || cs.publish_at.is_some() {
    ensure_no_conflicts(&tx, schema_id, cs.definitions.iter().map(|d| d.url.as_str()), now)?;
  }

  let id_str = encode_uuid(schema_id);
  let user_str = encode_uuid(cs.user_id);
  let now_str = encode_dt(now);
  let publish_str = cs.publish_at.map(encode_dt);

  if cs.schema_id.is_some() {
    tx.execute(
      "UPDATE schemas
       SET name = ?2, updated_at = ?3, published_at = COALESCE(published_at, ?4)
       WHERE schema_id = ?1",
      rusqlite::params![id_str, cs.name, now_str, publish_str],
    )?;
  } else {
    tx.execute(
      "INSERT INTO schemas (schema_id, name, created_by, created_at, updated_at, published_at)
       VALUES (?1, ?2, ?3, ?4, ?4, ?5)",
      rusqlite::params![id_str, cs.name, user_str, now_str, publish_str],
    )?;
  }

  // Definitions: keep listed ids, create new rows, drop the rest.
  let existing =
    child_ids(&tx, "SELECT ref_id FROM schema_refs WHERE schema_id = ?1", &id_str)?;
  let mut kept = HashSet::new();
  for d in &cs.definitions {
    let format = d.format.map(|f| f.to_string());
    match d.ref_id {
      Some(ref_id) => {
        let rid = encode_uuid(ref_id);
        if !existing.contains(&rid) {
          return Err(CoreError::SchemaRefNotFound(ref_id).into());
        }
        tx.execute(
          "UPDATE schema_refs SET url = ?2, name = ?3, format = ?4 WHERE ref_id = ?1",
          rusqlite::params![rid, d.url, d.name, format],
        )?;
        kept.insert(rid);
      }
      None => {
        tx.execute(
          "INSERT INTO schema_refs (ref_id, schema_id, url, name, format, created_by, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            encode_uuid(Uuid::new_v4()),
            id_str,
            d.url,
            d.name,
            format,
            user_str,
            now_str,
          ],
        )?;
      }
    }
  }
  for stale in existing.difference(&kept) {
    tx.execute(
      "DELETE FROM permanent_urls WHERE target_kind = ?1 AND target_id = ?2",
      rusqlite::params![TARGET_SCHEMA_REF, stale],
    )?;
    tx.execute("DELETE FROM schema_refs WHERE ref_id = ?1", rusqlite::params![stale])?;
  }

  // Documentation: same identity diff.
  let existing = child_ids(
    &tx,
    "SELECT item_id FROM documentation_items WHERE schema_id = ?1",
    &id_str,
  )?;
  let mut kept = HashSet::new();
  for d in &cs.documentation {
    let role = d.role.map(|r| r.to_string());
    let format = d.format.map(|f| f.to_string());
    match d.item_id {
      Some(item_id) => {
        let iid = encode_uuid(item_id);
        if !existing.contains(&iid) {
          return Err(CoreError::DocumentationItemNotFound(item_id).into());
        }
        tx.execute(
          "UPDATE documentation_items
           SET url = ?2, name = ?3, description = ?4, role = ?5, format = ?6
           WHERE item_id = ?1",
          rusqlite::params![iid, d.url, d.name, d.description, role, format],
        )?;
        kept.insert(iid);
      }
      None => {
        tx.execute(
          "INSERT INTO documentation_items (
             item_id, schema_id, url, name, description, role, format,
             created_by, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            encode_uuid(Uuid::new_v4()),
            id_str,
            d.url,
            d.name,
            d.description,
            role,
            format,
            user_str,
            now_str,
          ],
        )?;
      }
    }
  }
  for stale in existing.difference(&kept) {
    tx.execute(
      "DELETE FROM documentation_items WHERE item_id = ?1",
      rusqlite::params![stale],
    )?;
  }

  tx.commit()?;
  Ok(schema_id)
}

fn publish_tx(
  conn: &mut Connection,
  schema_id: Uuid,
  user_id: Uuid,
  at: DateTime<Utc>,
) -> Result<Schema> {
  let at = at.trunc_subsecs(6);
  let tx = conn.transaction()?;

  let schema = load_owned(&tx, schema_id, user_id)?;
  if schema.published_at.is_some() {
    return Err(CoreError::AlreadyPublished(schema_id).into());
  }

  let urls = query_list::<String, String>(
    &tx,
    "SELECT url FROM schema_refs WHERE schema_id = ?1",
    rusqlite::params![encode_uuid(schema_id)],
    |row| row.get(0),
    Ok,
  )?;
  if urls.is_empty() {
    return Err(CoreError::NoDefinitions.into());
  }
  ensure_no_conflicts(&tx, schema_id, urls.iter().map(String::as_str), at)?;

  tx.execute(
    "UPDATE schemas SET published_at = ?2, updated_at = ?2 WHERE schema_id = ?1",
    rusqlite::params![encode_uuid(schema_id), encode_dt(at)],
  )?;
  tx.commit()?;

  Ok(Schema { published_at: Some(at), updated_at: at, ..schema })
}

fn delete_tx(conn: &mut Connection, schema_id: Uuid, user_id: Uuid) -> Result<()> {
  let tx = conn.transaction()?;
  let schema = load_owned(&tx, schema_id, user_id)?;
  if schema.published_at.is_some() {
    return Err(CoreError::CannotDeletePublished(schema_id).into());
  }
  // Children and permanent URLs go with it (ON DELETE CASCADE).
  tx.execute(
    "DELETE FROM schemas WHERE schema_id = ?1",
    rusqlite::params![encode_uuid(schema_id)],
  )?;
  tx.commit()?;
  Ok(())
}

/// `%text%` for LIKE, with the pattern characters in `text` escaped.
fn like_pattern(text: &str) -> String {
  let escaped = text
    .replace('\\', "\\\\")
    .replace('%', "\\%")
    .replace('_', "\\_");
  format!("%{escaped}%")
}

// ─── RegistryStore impl ──────────────────────────────────────────────────────

impl RegistryStore for SqliteStore {
  type Error = crate::Error;

  // ── Accounts ──────────────────────────────────────────────────────────────

  async fn add_user(&self, username: &str, password_hash: &str) -> Result<User> {
    let user = User {
      user_id:    Uuid::new_v4(),
      username:   username.to_owned(),
      created_at: now(),
    };

    let id_str = encode_uuid(user.user_id);
    let name = user.username.clone();
    let hash = password_hash.to_owned();
    let at_str = encode_dt(user.created_at);

    self
      .with_conn(move |conn| {
        insert_unique(
          conn,
          "INSERT INTO users (user_id, username, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name, hash, at_str],
          || CoreError::UsernameTaken(name.clone()),
        )
      })
      .await?;

    Ok(user)
  }

  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(user_id);

    let raw: Option<RawUser> = self
      .with_conn(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM users WHERE user_id = ?1", RawUser::COLUMNS),
              rusqlite::params![id_str],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn find_user_credentials(&self, username: &str) -> Result<Option<(User, String)>> {
    let name = username.to_owned();

    let raw: Option<(RawUser, String)> = self
      .with_conn(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, username, created_at, password_hash
               FROM users WHERE username = ?1",
              rusqlite::params![name],
              |row| Ok((RawUser::from_row(row)?, row.get(3)?)),
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|(user, hash)| Ok((user.into_user()?, hash)))
      .transpose()
  }

  async fn add_organization(&self, input: NewOrganization) -> Result<Organization> {
    let org = Organization {
      organization_id: Uuid::new_v4(),
      name:            input.name,
      slug:            input.slug,
      created_by:      input.created_by,
      created_at:      now(),
    };

    let id_str = encode_uuid(org.organization_id);
    let name = org.name.clone();
    let slug = org.slug.clone();
    let by_str = encode_uuid(org.created_by);
    let at_str = encode_dt(org.created_at);

    self
      .with_conn(move |conn| {
        insert_unique(
          conn,
          "INSERT INTO organizations (organization_id, name, slug, created_by, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, name, slug, by_str, at_str],
          || CoreError::OrganizationSlugTaken(slug.clone()),
        )
      })
      .await?;

    Ok(org)
  }

  async fn get_organization(&self, organization_id: Uuid) -> Result<Option<Organization>> {
    let id_str = encode_uuid(organization_id);

    let raw: Option<RawOrganization> = self
      .with_conn(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM organizations WHERE organization_id = ?1",
                RawOrganization::COLUMNS
              ),
              rusqlite::params![id_str],
              RawOrganization::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawOrganization::into_organization).transpose()
  }

  async fn set_user_organization(
    &self,
    user_id: Uuid,
    organization_id: Option<Uuid>,
  ) -> Result<Profile> {
    let user_str = encode_uuid(user_id);
    let org_str = organization_id.map(encode_uuid);

    self
      .with_conn(move |conn| {
        conn.execute(
          "INSERT INTO profiles (user_id, organization_id) VALUES (?1, ?2)
           ON CONFLICT (user_id) DO UPDATE SET organization_id = excluded.organization_id",
          rusqlite::params![user_str, org_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(Profile { user_id, organization_id })
  }

  async fn get_profile(&self, user_id: Uuid) -> Result<Profile> {
    let user_str = encode_uuid(user_id);

    let raw: Option<RawProfile> = self
      .with_conn(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, organization_id FROM profiles WHERE user_id = ?1",
              rusqlite::params![user_str],
              |row| {
                Ok(RawProfile {
                  user_id:         row.get(0)?,
                  organization_id: row.get(1)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    match raw {
      Some(raw) => raw.into_profile(),
      None => Ok(Profile::empty(user_id)),
    }
  }

  // ── Schemas: reads ────────────────────────────────────────────────────────

  async fn get_schema(&self, schema_id: Uuid) -> Result<Option<Schema>> {
    self.with_conn(move |conn| load_schema(conn, schema_id)).await
  }

  async fn get_schema_detail(&self, schema_id: Uuid) -> Result<Option<SchemaDetail>> {
    self.with_conn(move |conn| load_detail(conn, schema_id)).await
  }

  async fn get_schema_ref(&self, ref_id: Uuid) -> Result<Option<SchemaRef>> {
    let id_str = encode_uuid(ref_id);

    let raw: Option<RawSchemaRef> = self
      .with_conn(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM schema_refs WHERE ref_id = ?1",
                RawSchemaRef::COLUMNS
              ),
              rusqlite::params![id_str],
              RawSchemaRef::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSchemaRef::into_schema_ref).transpose()
  }

  async fn list_public_schemas(&self, query: &SchemaQuery) -> Result<Vec<Schema>> {
    let now_str = encode_dt(now());
    let text_pattern = query.text.as_deref().map(like_pattern);
    let org_str = query.organization_id.map(encode_uuid);
    let format_str = query.format.map(|f| f.to_string());
    let limit_val = query.limit() as i64;
    let offset_val = query.offset() as i64;

    self
      .with_conn(move |conn| {
        query_list(
          conn,
          &format!(
            "SELECT {} FROM schemas s
             WHERE s.published_at IS NOT NULL
               AND s.published_at <= ?1
               AND EXISTS (
                 SELECT 1 FROM schema_refs r
                 WHERE r.schema_id = s.schema_id
                   AND (?3 IS NULL OR r.format = ?3)
               )
               AND (?2 IS NULL OR s.name LIKE ?2 ESCAPE '\\')
               AND (?4 IS NULL OR s.created_by IN (
                 SELECT user_id FROM profiles WHERE organization_id = ?4
               ))
             ORDER BY s.name, s.schema_id
             LIMIT ?5 OFFSET ?6",
            RawSchema::COLUMNS
          ),
          rusqlite::params![now_str, text_pattern, format_str, org_str, limit_val, offset_val],
          RawSchema::from_row,
          RawSchema::into_schema,
        )
      })
      .await
  }

  async fn list_schemas_by_owner(&self, user_id: Uuid) -> Result<Vec<Schema>> {
    let user_str = encode_uuid(user_id);

    self
      .with_conn(move |conn| {
        query_list(
          conn,
          &format!(
            "SELECT {} FROM schemas s WHERE s.created_by = ?1 ORDER BY s.name, s.schema_id",
            RawSchema::COLUMNS
          ),
          rusqlite::params![user_str],
          RawSchema::from_row,
          RawSchema::into_schema,
        )
      })
      .await
  }

  async fn published_refs(&self, excluding: Option<Uuid>) -> Result<Vec<PublishedRef>> {
    let now = now();
    self
      .with_conn(move |conn| load_published_refs(conn, excluding, now))
      .await
  }

  // ── Schemas: writes ───────────────────────────────────────────────────────

  async fn save_schema(&self, changeset: SchemaChangeset) -> Result<SchemaDetail> {
    let now = now();
    self
      .with_conn(move |conn| {
        let schema_id = save_changeset(conn, changeset, now)?;
        load_detail(conn, schema_id)?
          .ok_or_else(|| CoreError::SchemaNotFound(schema_id).into())
      })
      .await
  }

  async fn publish_schema(
    &self,
    schema_id: Uuid,
    user_id: Uuid,
    at: DateTime<Utc>,
  ) -> Result<Schema> {
    self
      .with_conn(move |conn| publish_tx(conn, schema_id, user_id, at))
      .await
  }

  async fn delete_schema(&self, schema_id: Uuid, user_id: Uuid) -> Result<()> {
    self
      .with_conn(move |conn| delete_tx(conn, schema_id, user_id))
      .await
  }

  // ── Permanent URLs ────────────────────────────────────────────────────────

  async fn add_permanent_url(&self, input: NewPermanentUrl) -> Result<PermanentUrl> {
    let link = PermanentUrl {
      permanent_url_id: Uuid::new_v4(),
      url:              input.url,
      schema_id:        input.schema_id,
      target:           input.target,
      created_by:       input.created_by,
      created_at:       now(),
    };

    let id_str = encode_uuid(link.permanent_url_id);
    let url = link.url.clone();
    let schema_str = encode_uuid(link.schema_id);
    let (target_kind, target_id) = encode_target(link.target);
    let by_str = encode_uuid(link.created_by);
    let at_str = encode_dt(link.created_at);

    self
      .with_conn(move |conn| {
        insert_unique(
          conn,
          "INSERT INTO permanent_urls (
             permanent_url_id, url, schema_id, target_kind, target_id,
             created_by, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, url, schema_str, target_kind, target_id, by_str, at_str],
          || CoreError::PermanentUrlTaken(url.clone()),
        )
      })
      .await?;

    Ok(link)
  }

  async fn list_permanent_urls(&self, schema_id: Uuid) -> Result<Vec<PermanentUrl>> {
    let id_str = encode_uuid(schema_id);

    self
      .with_conn(move |conn| {
        query_list(
          conn,
          &format!(
            "SELECT {} FROM permanent_urls WHERE schema_id = ?1 ORDER BY created_at, rowid",
            RawPermanentUrl::COLUMNS
          ),
          rusqlite::params![id_str],
          RawPermanentUrl::from_row,
          RawPermanentUrl::into_permanent_url,
        )
      })
      .await
  }

  async fn resolve_permanent_url(&self, url: &str) -> Result<Option<PermanentUrl>> {
    let url = url.to_owned();

    let raw: Option<RawPermanentUrl> = self
      .with_conn(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM permanent_urls WHERE url = ?1", RawPermanentUrl::COLUMNS),
              rusqlite::params![url],
              RawPermanentUrl::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPermanentUrl::into_permanent_url).transpose()
  }
}

#[cfg(test)]
mod tests {
  use super::like_pattern;

  #[test]
  fn like_pattern_escapes_wildcards() {
    assert_eq!(like_pattern("compose"), "%compose%");
    assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
  }
}
