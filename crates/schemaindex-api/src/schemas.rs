//! Handlers for public `/schemas` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/schemas` | `?q=&organization=&format=&limit=&offset=` |
//! | `GET`  | `/schemas/{id}` | ETag; `If-None-Match` → 304 |
//! | `GET`  | `/schemas/{id}/readme` | Current README rendered to HTML |
//! | `GET`  | `/schemas/{id}/definitions/{ref_id}` | Definition with fetched content |
//!
//! Unpublished schemas are only visible to their owner; everyone else gets
//! 404.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use schemaindex_core::{
  Error as CoreError,
  fetch::UrlFetcher,
  format::FormatTag,
  manage,
  schema::{DocumentationItem, Schema, SchemaDetail, SchemaRef},
  store::{RegistryStore, SchemaQuery},
  validate::parse_http_url,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiState, error::ApiError, etag, extract::Viewer, markdown};

/// Largest page a client may request.
pub const MAX_LIMIT: usize = 500;

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub q:            Option<String>,
  pub organization: Option<Uuid>,
  pub format:       Option<FormatTag>,
  pub limit:        Option<usize>,
  pub offset:       Option<usize>,
}

impl From<ListParams> for SchemaQuery {
  fn from(p: ListParams) -> Self {
    SchemaQuery {
      text:            p.q.filter(|q| !q.trim().is_empty()),
      organization_id: p.organization,
      format:          p.format,
      limit:           p.limit.map(|l| l.min(MAX_LIMIT)),
      offset:          p.offset,
    }
  }
}

/// `GET /schemas`
pub async fn list<S, F>(
  State(state): State<ApiState<S, F>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Schema>>, ApiError>
where
  S: RegistryStore,
  CoreError: From<S::Error>,
{
  let query = SchemaQuery::from(params);
  let schemas = state
    .store
    .list_public_schemas(&query)
    .await
    .map_err(CoreError::from)?;
  Ok(Json(schemas))
}

// ─── Detail ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SchemaView<'a> {
  #[serde(flatten)]
  pub detail:  &'a SchemaDetail,
  pub readme:  Option<&'a DocumentationItem>,
  pub license: Option<&'a DocumentationItem>,
}

/// `GET /schemas/{id}`
pub async fn get_one<S, F>(
  State(state): State<ApiState<S, F>>,
  viewer: Viewer,
  Path(id): Path<Uuid>,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  S: RegistryStore,
  CoreError: From<S::Error>,
{
  let detail = manage::visible_schema(state.store.as_ref(), viewer.user_id(), id).await?;
  let etag = etag::detail_etag(&detail);

  if etag::if_none_match(&headers, &etag) {
    return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
  }

  let view = SchemaView {
    detail:  &detail,
    readme:  detail.readme(),
    license: detail.license(),
  };
  Ok(([(header::ETAG, etag)], Json(view)).into_response())
}

// ─── README ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ReadmeView {
  pub readme: DocumentationItem,
  pub html:   String,
}

/// `GET /schemas/{id}/readme`
pub async fn readme<S, F>(
  State(state): State<ApiState<S, F>>,
  viewer: Viewer,
  Path(id): Path<Uuid>,
) -> Result<Json<ReadmeView>, ApiError>
where
  S: RegistryStore,
  F: UrlFetcher,
  CoreError: From<S::Error>,
{
  let detail = manage::visible_schema(state.store.as_ref(), viewer.user_id(), id).await?;
  let readme = detail
    .readme()
    .cloned()
    .ok_or_else(|| ApiError::NotFound(format!("schema {id} has no README")))?;

  let body = fetch_text(state.fetcher.as_ref(), &readme.url).await?;
  let html = markdown::render(readme.format, &body);
  Ok(Json(ReadmeView { readme, html }))
}

// ─── Definition ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DefinitionView {
  pub definition: SchemaRef,
  pub content:    String,
  /// Syntax-highlighting hint.
  pub language:   Option<FormatTag>,
}

/// `GET /schemas/{id}/definitions/{ref_id}`
pub async fn definition<S, F>(
  State(state): State<ApiState<S, F>>,
  viewer: Viewer,
  Path((id, ref_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<DefinitionView>, ApiError>
where
  S: RegistryStore,
  F: UrlFetcher,
  CoreError: From<S::Error>,
{
  let detail = manage::visible_schema(state.store.as_ref(), viewer.user_id(), id).await?;
  let definition = detail
    .definition(ref_id)
    .cloned()
    .ok_or(CoreError::SchemaRefNotFound(ref_id))?;

  let content = fetch_text(state.fetcher.as_ref(), &definition.url).await?;
  let language = definition.format;
  Ok(Json(DefinitionView { definition, content, language }))
}

/// Fetch a stored URL for display. Failures are upstream errors, not
/// validation rejections: the URL was valid when it was saved.
async fn fetch_text<F: UrlFetcher>(fetcher: &F, raw: &str) -> Result<String, ApiError> {
  let url = parse_http_url(raw)
    .ok_or_else(|| ApiError::Upstream(format!("stored URL {raw:?} is not valid")))?;
  let resp = fetcher
    .fetch(&url)
    .await
    .map_err(|e| ApiError::Upstream(e.to_string()))?;
  if !resp.is_ok() {
    tracing::debug!(%url, status = resp.status, "display fetch failed");
    return Err(ApiError::Upstream(format!(
      "{url} responded with HTTP status {}",
      resp.status
    )));
  }
  Ok(resp.body)
}
