//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use schemaindex_core::{Error as CoreError, conflict::Conflict, validate::FieldErrors};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("authentication required")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  /// A well-formed request the registry cannot accept as submitted.
  #[error("unprocessable: {0}")]
  Unprocessable(String),

  /// URL fields that failed validation; reported per field.
  #[error("invalid submission: {0}")]
  Invalid(FieldErrors),

  #[error("forbidden: {0}")]
  Forbidden(String),

  /// A registry policy refused the operation.
  #[error("conflict: {message}")]
  Conflict { message: String, conflicts: Vec<Conflict> },

  /// A referenced document could not be fetched for display.
  #[error("upstream error: {0}")]
  Upstream(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  fn conflict(message: impl ToString) -> Self {
    Self::Conflict { message: message.to_string(), conflicts: Vec::new() }
  }
}

impl From<CoreError> for ApiError {
  fn from(e: CoreError) -> Self {
    match e {
      CoreError::Invalid(fields) => Self::Invalid(fields),
      CoreError::EmptyName | CoreError::InvalidSlug(_) | CoreError::ReservedRole { .. } => {
        Self::Unprocessable(e.to_string())
      }
      CoreError::NotOwner(_) => Self::Forbidden(e.to_string()),
      CoreError::PublishConflict(conflicts) => Self::Conflict {
        message: "The provided URL is already in use by another Schema.".to_owned(),
        conflicts,
      },
      CoreError::NoDefinitions
      | CoreError::AlreadyPublished(_)
      | CoreError::CannotDeletePublished(_)
      | CoreError::NoOrganization(_)
      | CoreError::PermanentUrlTaken(_)
      | CoreError::UsernameTaken(_)
      | CoreError::OrganizationSlugTaken(_) => Self::conflict(e),
      CoreError::Store(inner) => Self::Store(inner),
      e if e.is_not_found() => Self::NotFound(e.to_string()),
      other => Self::Store(Box::new(other)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::Unauthorized => {
        let mut res = (
          StatusCode::UNAUTHORIZED,
          Json(json!({ "error": "authentication required" })),
        )
          .into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"schemaindex\""),
        );
        res
      }
      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": m }))).into_response()
      }
      ApiError::Unprocessable(m) => {
        (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "error": m }))).into_response()
      }
      ApiError::Invalid(fields) => (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "error": "invalid submission", "fields": fields })),
      )
        .into_response(),
      ApiError::Forbidden(m) => {
        (StatusCode::FORBIDDEN, Json(json!({ "error": m }))).into_response()
      }
      ApiError::Conflict { message, conflicts } => (
        StatusCode::CONFLICT,
        Json(json!({ "error": message, "conflicts": conflicts })),
      )
        .into_response(),
      ApiError::Upstream(m) => {
        (StatusCode::BAD_GATEWAY, Json(json!({ "error": m }))).into_response()
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({ "error": "internal server error" })),
        )
          .into_response()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use schemaindex_core::schema::DocumentationRole;
  use uuid::Uuid;

  use super::*;

  #[test]
  fn core_errors_map_to_statuses() {
    let status = |e: CoreError| ApiError::from(e).into_response().status();

    assert_eq!(status(CoreError::NotOwner(Uuid::nil())), StatusCode::FORBIDDEN);
    assert_eq!(status(CoreError::SchemaNotFound(Uuid::nil())), StatusCode::NOT_FOUND);
    assert_eq!(status(CoreError::NoDefinitions), StatusCode::CONFLICT);
    assert_eq!(status(CoreError::EmptyName), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
      status(CoreError::ReservedRole { index: 0, role: DocumentationRole::Readme }),
      StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(status(CoreError::PublishConflict(vec![])), StatusCode::CONFLICT);
    assert_eq!(
      status(CoreError::Invalid(FieldErrors::default())),
      StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(
      status(CoreError::Store("disk on fire".into())),
      StatusCode::INTERNAL_SERVER_ERROR
    );
  }

  #[test]
  fn unauthorized_carries_challenge() {
    let res = ApiError::Unauthorized.into_response();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().contains_key(header::WWW_AUTHENTICATE));
  }
}
