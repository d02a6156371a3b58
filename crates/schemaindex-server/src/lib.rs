//! Schema registry server: configuration, authentication, the HTTP fetcher
//! and router assembly around `schemaindex-api`.

pub mod auth;
pub mod error;
pub mod fetch;

pub use error::Error;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{Router, middleware};
use schemaindex_api::{ApiState, api_router};
use schemaindex_core::{Error as CoreError, fetch::UrlFetcher, store::RegistryStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SCHEMAINDEX_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  /// Public base URL, e.g. `https://schemas.example`.
  pub site_url:           String,
  pub store_path:         PathBuf,
  #[serde(default = "default_fetch_timeout_secs")]
  pub fetch_timeout_secs: u64,
  #[serde(default = "default_user_agent")]
  pub user_agent:         String,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_fetch_timeout_secs() -> u64 { 5 }

fn default_user_agent() -> String { concat!("schemaindex/", env!("CARGO_PKG_VERSION")).to_owned() }

impl ServerConfig {
  pub fn fetch_timeout(&self) -> Duration { Duration::from_secs(self.fetch_timeout_secs) }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The API router behind Basic authentication and request tracing.
pub fn app<S, F>(state: ApiState<S, F>) -> Router
where
  S: RegistryStore + 'static,
  F: UrlFetcher + 'static,
  CoreError: From<S::Error>,
{
  let store = Arc::clone(&state.store);
  api_router(state)
    .layer(middleware::from_fn_with_state(store, auth::authenticate::<S>))
    .layer(TraceLayer::new_for_http())
}
