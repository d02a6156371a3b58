//! Error types and axum `IntoResponse` implementation.

use axum::{
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Credentials were supplied but did not verify.
  #[error("unauthorized")]
  Unauthorized,

  #[error("password hashing failed: {0}")]
  Hash(String),

  #[error("http client error: {0}")]
  Client(#[from] reqwest::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized => {
        let mut res = (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"schemaindex\""),
        );
        res
      }
      other => {
        tracing::error!(error = %other, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
      }
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
