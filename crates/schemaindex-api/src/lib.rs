//! JSON REST API for the schema registry.
//!
//! Exposes an axum [`Router`] backed by any
//! [`schemaindex_core::store::RegistryStore`] and
//! [`schemaindex_core::fetch::UrlFetcher`]. Authentication, TLS and transport
//! concerns are the caller's responsibility: an authenticating layer inserts
//! an [`extract::CurrentUser`] into request extensions, and requests without
//! one are anonymous.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = schemaindex_api::api_router(ApiState::new(store, fetcher, site_url))
//!   .layer(auth_layer);
//! ```

pub mod account;
pub mod error;
pub mod etag;
pub mod extract;
pub mod manage;
pub mod markdown;
pub mod organizations;
pub mod permalinks;
pub mod schemas;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use schemaindex_core::{Error as CoreError, fetch::UrlFetcher, store::RegistryStore};

pub use error::ApiError;
pub use extract::CurrentUser;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S, F> {
  pub store:    Arc<S>,
  pub fetcher:  Arc<F>,
  /// Public base URL; permanent URLs are minted beneath it.
  pub site_url: Arc<str>,
}

impl<S, F> ApiState<S, F> {
  pub fn new(store: Arc<S>, fetcher: Arc<F>, site_url: impl Into<Arc<str>>) -> Self {
    Self { store, fetcher, site_url: site_url.into() }
  }
}

// Derived `Clone` would require `S: Clone` and `F: Clone`.
impl<S, F> Clone for ApiState<S, F> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      fetcher:  Arc::clone(&self.fetcher),
      site_url: Arc::clone(&self.site_url),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, F>(state: ApiState<S, F>) -> Router<()>
where
  S: RegistryStore + 'static,
  F: UrlFetcher + 'static,
  CoreError: From<S::Error>,
{
  Router::new()
    // Public browsing
    .route("/schemas", get(schemas::list::<S, F>))
    .route("/schemas/{id}", get(schemas::get_one::<S, F>))
    .route("/schemas/{id}/readme", get(schemas::readme::<S, F>))
    .route(
      "/schemas/{id}/definitions/{ref_id}",
      get(schemas::definition::<S, F>),
    )
    .route("/organizations/{id}", get(organizations::get_one::<S, F>))
    // Account
    .route("/account/profile", get(account::profile::<S, F>))
    .route("/account/organization", post(account::create_organization::<S, F>))
    // Management
    .route("/manage/schemas", post(manage::create::<S, F>))
    .route(
      "/manage/schemas/{id}",
      put(manage::update::<S, F>).delete(manage::delete::<S, F>),
    )
    .route("/manage/schemas/{id}/publish", post(manage::publish::<S, F>))
    .route(
      "/manage/schemas/{id}/permanent-urls",
      get(manage::list_permanent_urls::<S, F>).post(manage::create_permanent_url::<S, F>),
    )
    // Permanent URL redirects
    .route("/o/{org_slug}/{slug}", get(permalinks::resolve::<S, F>))
    .with_state(state)
}
