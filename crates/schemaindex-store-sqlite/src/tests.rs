//! Integration tests for `SqliteStore` against an in-memory database,
//! including the `manage` workflows running on top of it.

use schemaindex_core::{
  Error as CoreError,
  account::User,
  fetch::StaticFetcher,
  format::FormatTag,
  manage::{self, DocInput, RefInput, SchemaSubmission},
  permalink::PermanentUrlTarget,
  schema::{DocumentationFormat, DocumentationRole, SchemaDetail},
  store::{RegistryStore, SchemaQuery},
  validate::{FieldPath, Rejection},
};
use uuid::Uuid;

use crate::SqliteStore;

const SITE: &str = "https://schemas.example";

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, name: &str) -> User {
  manage::register_user(s, name, "$argon2id$test").await.unwrap()
}

fn fetcher() -> StaticFetcher {
  StaticFetcher::new()
    .with("http://example.com/definiton.json", 200, "{}")
    .with("https://example.com/definiton.json", 200, "{}")
    .with("https://example.com/other.cddl", 200, "root = any")
    .with("https://example.com/third.yaml", 200, "a: 1")
    .with("https://example.com/README.md", 200, "# Title")
    .with("https://example.com/LICENSE", 200, "MIT")
    .with("https://example.com/empty.json", 200, "")
    .with("https://example.com/gone.json", 404, "")
    .with("https://github.com/org/repo/blob/main/s.json", 200, "<html>")
    .with(
      "https://raw.githubusercontent.com/org/repo/refs/heads/main/s.json",
      200,
      "{}",
    )
}

fn def(url: &str) -> RefInput {
  RefInput { ref_id: None, url: url.into(), name: None }
}

fn doc(url: &str) -> DocInput {
  DocInput {
    item_id:     None,
    url:         url.into(),
    name:        None,
    description: None,
    role:        None,
  }
}

fn submission(name: &str, urls: &[&str], publish: bool) -> SchemaSubmission {
  SchemaSubmission {
    name: name.into(),
    definitions: urls.iter().map(|u| def(u)).collect(),
    readme: None,
    license: None,
    documentation: vec![],
    publish,
  }
}

async fn submit(
  s: &SqliteStore,
  user: &User,
  existing: Option<Uuid>,
  sub: SchemaSubmission,
) -> Result<SchemaDetail, CoreError> {
  manage::submit_schema(s, &fetcher(), user.user_id, existing, sub).await
}

// ─── Accounts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_find_user() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let fetched = s.get_user(alice.user_id).await.unwrap().unwrap();
  assert_eq!(fetched, alice);

  let (found, hash) = s.find_user_credentials("alice").await.unwrap().unwrap();
  assert_eq!(found.user_id, alice.user_id);
  assert_eq!(hash, "$argon2id$test");

  assert!(s.find_user_credentials("bob").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_username_is_refused() {
  let s = store().await;
  user(&s, "alice").await;
  let err = manage::register_user(&s, "alice", "x").await.unwrap_err();
  assert!(matches!(err, CoreError::UsernameTaken(name) if name == "alice"));
}

#[tokio::test]
async fn organization_membership_is_recorded_on_profile() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let profile = s.get_profile(alice.user_id).await.unwrap();
  assert_eq!(profile.organization_id, None);

  let org = manage::create_organization(&s, alice.user_id, "Acme", "acme")
    .await
    .unwrap();
  let profile = s.get_profile(alice.user_id).await.unwrap();
  assert_eq!(profile.organization_id, Some(org.organization_id));
  assert_eq!(
    s.get_organization(org.organization_id).await.unwrap().unwrap().slug,
    "acme"
  );

  let err = manage::create_organization(&s, alice.user_id, "Acme 2", "acme")
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::OrganizationSlugTaken(_)));
}

// ─── Submissions ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn draft_with_readme_and_license() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let mut sub = submission("Compose", &["https://example.com/other.cddl"], false);
  sub.readme = Some(doc("https://example.com/README.md"));
  sub.license = Some(doc("https://example.com/LICENSE"));

  let detail = submit(&s, &alice, None, sub).await.unwrap();
  assert!(!detail.schema.is_published());
  assert_eq!(detail.definitions.len(), 1);
  assert_eq!(detail.definitions[0].format, Some(FormatTag::Cddl));

  let readme = detail.readme().unwrap();
  assert_eq!(readme.format, Some(DocumentationFormat::Markdown));
  let license = detail.license().unwrap();
  assert_eq!(license.format, Some(DocumentationFormat::PlainText));
  assert_eq!(license.name, "https://example.com/LICENSE");
}

#[tokio::test]
async fn rejections_are_aggregated_in_field_order() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let mut sub = submission(
    "Broken",
    &["https://example.com/other.cddl", "https://example.com/gone.json"],
    false,
  );
  sub.readme = Some(doc("https://example.com/empty.json"));
  sub.documentation = vec![doc("not a url")];

  let err = submit(&s, &alice, None, sub).await.unwrap_err();
  let CoreError::Invalid(errors) = err else { panic!("expected field errors") };
  let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
  assert_eq!(
    fields,
    vec![FieldPath::Definition(1), FieldPath::Readme, FieldPath::Documentation(0)]
  );
  assert_eq!(
    errors.get(FieldPath::Definition(1)),
    Some(&Rejection::BadStatus { status: 404 })
  );
  assert_eq!(errors.get(FieldPath::Readme), Some(&Rejection::EmptyContent));

  // Nothing was written.
  assert!(s.list_schemas_by_owner(alice.user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn schema_needs_a_definition_and_a_name() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let err = submit(&s, &alice, None, submission("Empty", &[], true))
    .await
    .unwrap_err();
  assert_eq!(err.to_string(), "A schema must have at least one definition");

  let err = submit(&s, &alice, None, submission("  ", &["https://example.com/other.cddl"], false))
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::EmptyName));
}

#[tokio::test]
async fn emptied_edit_leaves_stored_rows_untouched() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let mut sub = submission("Compose", &["https://example.com/other.cddl"], false);
  sub.readme = Some(doc("https://example.com/README.md"));
  sub.license = Some(doc("https://example.com/LICENSE"));
  let before = submit(&s, &alice, None, sub).await.unwrap();
  let id = before.schema.schema_id;

  let err = submit(&s, &alice, Some(id), submission("Renamed", &[], false))
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::NoDefinitions));

  // The store refuses the same changeset on its own.
  let err = s
    .save_schema(schemaindex_core::schema::SchemaChangeset {
      schema_id:     Some(id),
      name:          "Renamed".into(),
      user_id:       alice.user_id,
      definitions:   vec![],
      documentation: vec![],
      publish_at:    None,
    })
    .await
    .unwrap_err();
  assert!(matches!(CoreError::from(err), CoreError::NoDefinitions));

  let after = s.get_schema_detail(id).await.unwrap().unwrap();
  assert_eq!(after.schema, before.schema);
  assert_eq!(after.definitions, before.definitions);
  assert_eq!(after.documentation, before.documentation);
}

// ─── Conflicts ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn published_url_blocks_same_resource_under_other_scheme() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  submit(&s, &alice, None, submission("A", &["http://example.com/definiton.json"], true))
    .await
    .unwrap();

  // A draft may reuse the URL; publishing may not.
  let draft = submit(&s, &bob, None, submission("B", &["https://example.com/definiton.json"], false))
    .await
    .unwrap();
  assert!(!draft.schema.is_published());

  let err = submit(&s, &bob, None, submission("C", &["https://example.com/definiton.json"], true))
    .await
    .unwrap_err();
  let CoreError::Invalid(errors) = err else { panic!("expected field errors") };
  let rejection = errors.get(FieldPath::Definition(0)).unwrap();
  assert_eq!(
    rejection.to_string(),
    "The provided URL is already in use by another Schema."
  );
}

#[tokio::test]
async fn github_blob_and_raw_refs_heads_conflict() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  submit(&s, &alice, None, submission("A", &["https://github.com/org/repo/blob/main/s.json"], true))
    .await
    .unwrap();

  let err = submit(
    &s,
    &bob,
    None,
    submission("B", &["https://raw.githubusercontent.com/org/repo/refs/heads/main/s.json"], true),
  )
  .await
  .unwrap_err();
  assert!(matches!(err, CoreError::Invalid(_)));
}

#[tokio::test]
async fn editing_a_published_schema_ignores_its_own_refs() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let detail = submit(&s, &alice, None, submission("A", &["http://example.com/definiton.json"], true))
    .await
    .unwrap();
  let id = detail.schema.schema_id;

  let mut edit = submission("A renamed", &["https://example.com/definiton.json"], false);
  edit.definitions[0].ref_id = Some(detail.definitions[0].ref_id);
  let edited = submit(&s, &alice, Some(id), edit).await.unwrap();
  assert_eq!(edited.schema.name, "A renamed");
  assert!(edited.schema.is_published());
  assert_eq!(edited.definitions[0].url, "https://example.com/definiton.json");
}

#[tokio::test]
async fn unpublished_schemas_do_not_block_publication() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  submit(&s, &alice, None, submission("Draft", &["https://example.com/other.cddl"], false))
    .await
    .unwrap();
  let published = submit(&s, &bob, None, submission("B", &["https://example.com/other.cddl"], true))
    .await
    .unwrap();
  assert!(published.schema.is_published());
}

// ─── Identity diff ───────────────────────────────────────────────────────────

#[tokio::test]
async fn edits_keep_listed_rows_and_drop_the_rest() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let first = submit(
    &s,
    &alice,
    None,
    submission("A", &["https://example.com/other.cddl", "https://example.com/third.yaml"], false),
  )
  .await
  .unwrap();
  let id = first.schema.schema_id;
  let kept = first.definitions[0].ref_id;
  let dropped = first.definitions[1].ref_id;

  let mut edit = submission(
    "A",
    &["https://example.com/other.cddl", "https://example.com/definiton.json"],
    false,
  );
  edit.definitions[0].ref_id = Some(kept);
  let second = submit(&s, &alice, Some(id), edit).await.unwrap();

  let ids: Vec<_> = second.definitions.iter().map(|r| r.ref_id).collect();
  assert_eq!(ids.len(), 2);
  assert!(ids.contains(&kept));
  assert!(!ids.contains(&dropped));
  assert!(s.get_schema_ref(dropped).await.unwrap().is_none());
}

#[tokio::test]
async fn foreign_ref_id_is_refused() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let a = submit(&s, &alice, None, submission("A", &["https://example.com/other.cddl"], false))
    .await
    .unwrap();
  let b = submit(&s, &alice, None, submission("B", &["https://example.com/third.yaml"], false))
    .await
    .unwrap();

  let mut edit = submission("B", &["https://example.com/third.yaml"], false);
  edit.definitions[0].ref_id = Some(a.definitions[0].ref_id);
  let err = submit(&s, &alice, Some(b.schema.schema_id), edit).await.unwrap_err();
  assert!(matches!(err, CoreError::SchemaRefNotFound(_)));
}

#[tokio::test]
async fn only_the_owner_may_edit() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let a = submit(&s, &alice, None, submission("A", &["https://example.com/other.cddl"], false))
    .await
    .unwrap();
  let err = submit(
    &s,
    &bob,
    Some(a.schema.schema_id),
    submission("Mine now", &["https://example.com/other.cddl"], false),
  )
  .await
  .unwrap_err();
  assert!(matches!(err, CoreError::NotOwner(_)));
}

// ─── Publish and delete ──────────────────────────────────────────────────────

#[tokio::test]
async fn publish_reports_each_conflict() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let a = submit(&s, &alice, None, submission("A", &["http://example.com/definiton.json"], true))
    .await
    .unwrap();
  let b = submit(
    &s,
    &bob,
    None,
    submission("B", &["https://example.com/definiton.json", "https://example.com/other.cddl"], false),
  )
  .await
  .unwrap();

  let err = manage::publish_schema(&s, bob.user_id, b.schema.schema_id)
    .await
    .unwrap_err();
  let CoreError::PublishConflict(conflicts) = err else { panic!("expected conflict") };
  assert_eq!(conflicts.len(), 1);
  assert_eq!(conflicts[0].url, "https://example.com/definiton.json");
  assert_eq!(conflicts[0].existing.schema_id, a.schema.schema_id);
  assert_eq!(conflicts[0].existing.schema_name, "A");
}

#[tokio::test]
async fn store_refuses_conflicting_publish_on_its_own() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  submit(&s, &alice, None, submission("A", &["http://example.com/definiton.json"], true))
    .await
    .unwrap();
  let b = submit(&s, &bob, None, submission("B", &["https://example.com/definiton.json"], false))
    .await
    .unwrap();

  let err = s
    .publish_schema(b.schema.schema_id, bob.user_id, chrono::Utc::now())
    .await
    .unwrap_err();
  assert!(matches!(CoreError::from(err), CoreError::PublishConflict(_)));
}

#[tokio::test]
async fn publish_once_by_owner_only() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let a = submit(&s, &alice, None, submission("A", &["https://example.com/other.cddl"], false))
    .await
    .unwrap();
  let id = a.schema.schema_id;

  let err = manage::publish_schema(&s, bob.user_id, id).await.unwrap_err();
  assert!(matches!(err, CoreError::NotOwner(_)));

  let published = manage::publish_schema(&s, alice.user_id, id).await.unwrap();
  assert!(published.is_published());

  let err = manage::publish_schema(&s, alice.user_id, id).await.unwrap_err();
  assert!(matches!(err, CoreError::AlreadyPublished(_)));
}

#[tokio::test]
async fn delete_only_while_unpublished() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let draft = submit(&s, &alice, None, submission("Draft", &["https://example.com/other.cddl"], false))
    .await
    .unwrap();
  let live = submit(&s, &alice, None, submission("Live", &["https://example.com/third.yaml"], true))
    .await
    .unwrap();

  let err = manage::delete_schema(&s, alice.user_id, live.schema.schema_id)
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::CannotDeletePublished(_)));

  manage::delete_schema(&s, alice.user_id, draft.schema.schema_id)
    .await
    .unwrap();
  assert!(s.get_schema(draft.schema.schema_id).await.unwrap().is_none());
  assert!(s.get_schema_ref(draft.definitions[0].ref_id).await.unwrap().is_none());
}

// ─── Browsing ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn public_listing_filters_and_orders() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let org = manage::create_organization(&s, bob.user_id, "Bobs", "bobs")
    .await
    .unwrap();

  submit(&s, &alice, None, submission("Zeta", &["https://example.com/other.cddl"], true))
    .await
    .unwrap();
  submit(&s, &bob, None, submission("Alpha", &["https://example.com/third.yaml"], true))
    .await
    .unwrap();
  submit(&s, &alice, None, submission("Hidden draft", &["https://example.com/other.cddl"], false))
    .await
    .unwrap();

  let all = s.list_public_schemas(&SchemaQuery::default()).await.unwrap();
  let names: Vec<_> = all.iter().map(|s| s.name.as_str()).collect();
  assert_eq!(names, vec!["Alpha", "Zeta"]);

  let by_text = s
    .list_public_schemas(&SchemaQuery { text: Some("ZET".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(by_text.len(), 1);
  assert_eq!(by_text[0].name, "Zeta");

  let by_format = s
    .list_public_schemas(&SchemaQuery { format: Some(FormatTag::Yaml), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(by_format.len(), 1);
  assert_eq!(by_format[0].name, "Alpha");

  let by_org = s
    .list_public_schemas(&SchemaQuery {
      organization_id: Some(org.organization_id),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(by_org.len(), 1);
  assert_eq!(by_org[0].created_by, bob.user_id);

  let paged = s
    .list_public_schemas(&SchemaQuery { limit: Some(1), offset: Some(1), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(paged.len(), 1);
  assert_eq!(paged[0].name, "Zeta");
}

#[tokio::test]
async fn drafts_are_visible_to_their_owner_only() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let draft = submit(&s, &alice, None, submission("Draft", &["https://example.com/other.cddl"], false))
    .await
    .unwrap();
  let id = draft.schema.schema_id;

  assert!(manage::visible_schema(&s, Some(alice.user_id), id).await.is_ok());
  let err = manage::visible_schema(&s, Some(bob.user_id), id).await.unwrap_err();
  assert!(matches!(err, CoreError::SchemaNotFound(_)));
  assert!(manage::visible_schema(&s, None, id).await.is_err());
}

// ─── Permanent URLs ──────────────────────────────────────────────────────────

#[tokio::test]
async fn permanent_url_requires_an_organization() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let a = submit(&s, &alice, None, submission("A", &["https://example.com/other.cddl"], false))
    .await
    .unwrap();

  let err = manage::create_permanent_url(&s, alice.user_id, SITE, a.schema.schema_id, None, "a")
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::NoOrganization(_)));
}

#[tokio::test]
async fn permanent_urls_resolve_and_stay_unique() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  manage::create_organization(&s, alice.user_id, "Acme", "acme")
    .await
    .unwrap();
  let a = submit(&s, &alice, None, submission("A", &["https://example.com/other.cddl"], true))
    .await
    .unwrap();
  let schema_id = a.schema.schema_id;
  let ref_id = a.definitions[0].ref_id;

  let err = manage::create_permanent_url(&s, alice.user_id, SITE, schema_id, None, "Bad Slug")
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::InvalidSlug(_)));

  let link = manage::create_permanent_url(&s, alice.user_id, SITE, schema_id, None, "compose")
    .await
    .unwrap();
  assert_eq!(link.url, "https://schemas.example/o/acme/compose");
  assert_eq!(link.target, PermanentUrlTarget::Schema(schema_id));

  let err = manage::create_permanent_url(&s, alice.user_id, SITE, schema_id, None, "compose")
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::PermanentUrlTaken(_)));

  let def_link =
    manage::create_permanent_url(&s, alice.user_id, SITE, schema_id, Some(ref_id), "compose-v1")
      .await
      .unwrap();
  let resolved = manage::resolve_permanent_url(&s, SITE, "acme", "compose-v1")
    .await
    .unwrap();
  assert_eq!(resolved, def_link);
  assert_eq!(
    resolved.location(),
    format!("/schemas/{schema_id}/definitions/{ref_id}")
  );

  assert_eq!(s.list_permanent_urls(schema_id).await.unwrap().len(), 2);
  let detail = s.get_schema_detail(schema_id).await.unwrap().unwrap();
  assert_eq!(detail.permanent_urls.len(), 2);

  let err = manage::resolve_permanent_url(&s, SITE, "acme", "missing")
    .await
    .unwrap_err();
  assert!(err.is_not_found());
}

#[tokio::test]
async fn dropping_a_definition_drops_its_permanent_urls() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  manage::create_organization(&s, alice.user_id, "Acme", "acme")
    .await
    .unwrap();
  let a = submit(
    &s,
    &alice,
    None,
    submission("A", &["https://example.com/other.cddl", "https://example.com/third.yaml"], false),
  )
  .await
  .unwrap();
  let schema_id = a.schema.schema_id;

  manage::create_permanent_url(
    &s,
    alice.user_id,
    SITE,
    schema_id,
    Some(a.definitions[1].ref_id),
    "third",
  )
  .await
  .unwrap();

  let mut edit = submission("A", &["https://example.com/other.cddl"], false);
  edit.definitions[0].ref_id = Some(a.definitions[0].ref_id);
  submit(&s, &alice, Some(schema_id), edit).await.unwrap();

  assert!(s.list_permanent_urls(schema_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn documentation_roles_are_stored() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let mut sub = submission("A", &["https://example.com/other.cddl"], false);
  sub.documentation = vec![DocInput {
    role: Some(DocumentationRole::Rfc),
    name: Some("RFC 8610".into()),
    ..doc("https://example.com/README.md")
  }];
  let detail = submit(&s, &alice, None, sub).await.unwrap();

  let rfc = detail.current(DocumentationRole::Rfc).unwrap();
  assert_eq!(rfc.name, "RFC 8610");
  assert!(detail.readme().is_none());
}

#[tokio::test]
async fn documentation_list_cannot_claim_readme_or_license() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  for role in [DocumentationRole::Readme, DocumentationRole::License] {
    let mut sub = submission("A", &["https://example.com/other.cddl"], false);
    sub.readme = Some(doc("https://example.com/README.md"));
    sub.documentation = vec![
      doc("https://example.com/LICENSE"),
      DocInput { role: Some(role), ..doc("https://example.com/third.yaml") },
    ];
    let err = submit(&s, &alice, None, sub).await.unwrap_err();
    assert!(matches!(err, CoreError::ReservedRole { index: 1, role: r } if r == role));
  }

  // Nothing was written.
  assert!(s.list_schemas_by_owner(alice.user_id).await.unwrap().is_empty());
}
