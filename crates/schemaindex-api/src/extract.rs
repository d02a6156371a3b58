//! Request identity extractors.
//!
//! Authentication itself happens outside this crate: the embedding server
//! verifies credentials and inserts a [`CurrentUser`] into the request
//! extensions. Handlers only read it back.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;

/// The authenticated caller. Rejects with 401 when the request is anonymous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
  pub user_id:  Uuid,
  pub username: String,
}

impl<St> FromRequestParts<St> for CurrentUser
where
  St: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<CurrentUser>()
      .cloned()
      .ok_or(ApiError::Unauthorized)
  }
}

/// The caller if authenticated; never rejects.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<CurrentUser>);

impl Viewer {
  pub fn user_id(&self) -> Option<Uuid> { self.0.as_ref().map(|u| u.user_id) }
}

impl<St> FromRequestParts<St> for Viewer
where
  St: Send + Sync,
{
  type Rejection = Infallible;

  async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
    Ok(Viewer(parts.extensions.get::<CurrentUser>().cloned()))
  }
}
