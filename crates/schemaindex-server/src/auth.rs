//! HTTP Basic authentication against stored argon2 password hashes.
//!
//! The middleware never rejects an anonymous request; it only attaches a
//! [`CurrentUser`] when valid credentials are present. Handlers that need a
//! user reject on their own. Credentials that are present but wrong are a
//! 401 for every route.

use std::sync::Arc;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::{Request, State},
  http::{HeaderMap, header},
  middleware::Next,
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use rand_core::OsRng;
use schemaindex_api::CurrentUser;
use schemaindex_core::{account::User, store::RegistryStore};

use crate::error::{Error, Result};

/// Produce an argon2 PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| Error::Hash(e.to_string()))
}

/// Username and password from an `Authorization: Basic` header.
///
/// `Ok(None)` when the header is absent; malformed headers are
/// [`Error::Unauthorized`].
pub fn basic_credentials(headers: &HeaderMap) -> Result<Option<(String, String)>> {
  let Some(value) = headers.get(header::AUTHORIZATION) else {
    return Ok(None);
  };
  let value = value.to_str().map_err(|_| Error::Unauthorized)?;
  let encoded = value.strip_prefix("Basic ").ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded.trim()).map_err(|_| Error::Unauthorized)?;
  let creds = String::from_utf8(decoded).map_err(|_| Error::Unauthorized)?;
  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;

  Ok(Some((username.to_owned(), password.to_owned())))
}

/// Look the user up and check `password` against the stored hash.
pub async fn verify_credentials<S>(store: &S, username: &str, password: &str) -> Result<User>
where
  S: RegistryStore,
{
  let (user, stored_hash) = store
    .find_user_credentials(username)
    .await
    .map_err(|e| Error::Store(Box::new(e)))?
    .ok_or(Error::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&stored_hash).map_err(|_| Error::Unauthorized)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(user)
}

/// Middleware: attach the authenticated [`CurrentUser`], if any.
pub async fn authenticate<S>(
  State(store): State<Arc<S>>,
  mut req: Request,
  next: Next,
) -> Result<Response>
where
  S: RegistryStore,
{
  if let Some((username, password)) = basic_credentials(req.headers())? {
    let user = verify_credentials(store.as_ref(), &username, &password)
      .await
      .inspect_err(|_| tracing::debug!(%username, "authentication failed"))?;
    req.extensions_mut().insert(CurrentUser {
      user_id:  user.user_id,
      username: user.username,
    });
  }
  Ok(next.run(req).await)
}
