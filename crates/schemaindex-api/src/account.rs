//! Handlers for the caller's own account.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/account/profile` | User, organization and every own schema |
//! | `POST` | `/account/organization` | Body: `{"name":"…","slug":"…"}`; joins it |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use schemaindex_core::{
  Error as CoreError,
  account::{Organization, Profile, User},
  manage,
  schema::Schema,
  store::RegistryStore,
};
use serde::{Deserialize, Serialize};

use crate::{ApiState, error::ApiError, extract::CurrentUser};

#[derive(Debug, Serialize)]
pub struct ProfileView {
  pub user:         User,
  pub profile:      Profile,
  pub organization: Option<Organization>,
  /// Published and unpublished, ordered by name.
  pub schemas:      Vec<Schema>,
}

/// `GET /account/profile`
pub async fn profile<S, F>(
  State(state): State<ApiState<S, F>>,
  current: CurrentUser,
) -> Result<Json<ProfileView>, ApiError>
where
  S: RegistryStore,
  CoreError: From<S::Error>,
{
  let store = state.store.as_ref();
  let user = store
    .get_user(current.user_id)
    .await
    .map_err(CoreError::from)?
    .ok_or(CoreError::UserNotFound(current.user_id))?;
  let profile = store.get_profile(user.user_id).await.map_err(CoreError::from)?;

  let organization = match profile.organization_id {
    Some(id) => store.get_organization(id).await.map_err(CoreError::from)?,
    None => None,
  };
  let schemas = store
    .list_schemas_by_owner(user.user_id)
    .await
    .map_err(CoreError::from)?;

  Ok(Json(ProfileView { user, profile, organization, schemas }))
}

#[derive(Debug, Deserialize)]
pub struct OrganizationBody {
  pub name: String,
  pub slug: String,
}

/// `POST /account/organization`
pub async fn create_organization<S, F>(
  State(state): State<ApiState<S, F>>,
  current: CurrentUser,
  Json(body): Json<OrganizationBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore,
  CoreError: From<S::Error>,
{
  let org = manage::create_organization(
    state.store.as_ref(),
    current.user_id,
    &body.name,
    &body.slug,
  )
  .await?;
  Ok((StatusCode::CREATED, Json(org)))
}
