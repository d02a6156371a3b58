//! Handler for `GET /organizations/{id}`.

use axum::{
  Json,
  extract::{Path, State},
};
use schemaindex_core::{
  Error as CoreError,
  account::Organization,
  schema::Schema,
  store::{RegistryStore, SchemaQuery},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct OrganizationView {
  pub organization: Organization,
  /// Published schemas of the organization's members.
  pub schemas:      Vec<Schema>,
}

/// `GET /organizations/{id}`
pub async fn get_one<S, F>(
  State(state): State<ApiState<S, F>>,
  Path(id): Path<Uuid>,
) -> Result<Json<OrganizationView>, ApiError>
where
  S: RegistryStore,
  CoreError: From<S::Error>,
{
  let organization = state
    .store
    .get_organization(id)
    .await
    .map_err(CoreError::from)?
    .ok_or(CoreError::OrganizationNotFound(id))?;

  let query = SchemaQuery { organization_id: Some(id), ..SchemaQuery::default() };
  let schemas = state
    .store
    .list_public_schemas(&query)
    .await
    .map_err(CoreError::from)?;

  Ok(Json(OrganizationView { organization, schemas }))
}
