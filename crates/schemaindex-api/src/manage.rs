//! Handlers for authenticated `/manage/schemas` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/manage/schemas` | Body: [`SchemaSubmission`]; 201 |
//! | `PUT`    | `/manage/schemas/{id}` | Full replacement; owner only |
//! | `DELETE` | `/manage/schemas/{id}` | 204; refused once published |
//! | `POST`   | `/manage/schemas/{id}/publish` | 409 with conflicts on collision |
//! | `GET`    | `/manage/schemas/{id}/permanent-urls` | Owner only |
//! | `POST`   | `/manage/schemas/{id}/permanent-urls` | Body: `{"slug":"…","ref_id":…}` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use schemaindex_core::{
  Error as CoreError,
  fetch::UrlFetcher,
  manage::{self, SchemaSubmission},
  permalink::PermanentUrl,
  schema::{Schema, SchemaDetail},
  store::RegistryStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError, extract::CurrentUser};

// ─── Create / update ─────────────────────────────────────────────────────────

/// `POST /manage/schemas`
pub async fn create<S, F>(
  State(state): State<ApiState<S, F>>,
  user: CurrentUser,
  Json(submission): Json<SchemaSubmission>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore,
  F: UrlFetcher,
  CoreError: From<S::Error>,
{
  let detail = manage::submit_schema(
    state.store.as_ref(),
    state.fetcher.as_ref(),
    user.user_id,
    None,
    submission,
  )
  .await?;
  Ok((StatusCode::CREATED, Json(detail)))
}

/// `PUT /manage/schemas/{id}`
pub async fn update<S, F>(
  State(state): State<ApiState<S, F>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
  Json(submission): Json<SchemaSubmission>,
) -> Result<Json<SchemaDetail>, ApiError>
where
  S: RegistryStore,
  F: UrlFetcher,
  CoreError: From<S::Error>,
{
  let detail = manage::submit_schema(
    state.store.as_ref(),
    state.fetcher.as_ref(),
    user.user_id,
    Some(id),
    submission,
  )
  .await?;
  Ok(Json(detail))
}

// ─── Delete / publish ────────────────────────────────────────────────────────

/// `DELETE /manage/schemas/{id}`
pub async fn delete<S, F>(
  State(state): State<ApiState<S, F>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: RegistryStore,
  CoreError: From<S::Error>,
{
  manage::delete_schema(state.store.as_ref(), user.user_id, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /manage/schemas/{id}/publish`
pub async fn publish<S, F>(
  State(state): State<ApiState<S, F>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Schema>, ApiError>
where
  S: RegistryStore,
  CoreError: From<S::Error>,
{
  let schema = manage::publish_schema(state.store.as_ref(), user.user_id, id).await?;
  Ok(Json(schema))
}

// ─── Permanent URLs ──────────────────────────────────────────────────────────

/// `GET /manage/schemas/{id}/permanent-urls`
pub async fn list_permanent_urls<S, F>(
  State(state): State<ApiState<S, F>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<PermanentUrl>>, ApiError>
where
  S: RegistryStore,
  CoreError: From<S::Error>,
{
  let schema = state
    .store
    .get_schema(id)
    .await
    .map_err(CoreError::from)?
    .ok_or(CoreError::SchemaNotFound(id))?;
  if schema.created_by != user.user_id {
    return Err(CoreError::NotOwner(id).into());
  }

  let links = state
    .store
    .list_permanent_urls(id)
    .await
    .map_err(CoreError::from)?;
  Ok(Json(links))
}

#[derive(Debug, Deserialize)]
pub struct PermanentUrlBody {
  pub slug:   String,
  /// Point at this definition instead of the schema page.
  #[serde(default)]
  pub ref_id: Option<Uuid>,
}

/// `POST /manage/schemas/{id}/permanent-urls`
pub async fn create_permanent_url<S, F>(
  State(state): State<ApiState<S, F>>,
  user: CurrentUser,
  Path(id): Path<Uuid>,
  Json(body): Json<PermanentUrlBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore,
  CoreError: From<S::Error>,
{
  let link = manage::create_permanent_url(
    state.store.as_ref(),
    user.user_id,
    &state.site_url,
    id,
    body.ref_id,
    &body.slug,
  )
  .await?;
  Ok((StatusCode::CREATED, Json(link)))
}
