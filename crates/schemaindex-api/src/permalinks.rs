//! Permanent URL redirects: `GET /o/{org_slug}/{slug}`.

use axum::{
  extract::{Path, State},
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use schemaindex_core::{Error as CoreError, manage, store::RegistryStore};

use crate::{ApiState, error::ApiError};

/// `GET /o/{org_slug}/{slug}`: 302 to the target's public page.
pub async fn resolve<S, F>(
  State(state): State<ApiState<S, F>>,
  Path((org_slug, slug)): Path<(String, String)>,
) -> Result<Response, ApiError>
where
  S: RegistryStore,
  CoreError: From<S::Error>,
{
  let link =
    manage::resolve_permanent_url(state.store.as_ref(), &state.site_url, &org_slug, &slug)
      .await?;
  tracing::debug!(url = %link.url, target = ?link.target, "permanent URL resolved");
  Ok((StatusCode::FOUND, [(header::LOCATION, link.location())]).into_response())
}
