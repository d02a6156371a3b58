//! The `UrlFetcher` trait, the core's only network dependency.
//!
//! Implementations perform a single GET per call with no retries. The
//! production client lives in `schemaindex-server`; [`StaticFetcher`] serves
//! canned responses for tests and offline runs.

use std::{collections::HashMap, future::Future};

use thiserror::Error;
use url::Url;

/// HTTP status treated as success by the validation pipeline.
pub const STATUS_OK: u16 = 200;

/// What came back from a GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
  pub status: u16,
  /// Decoded text body. Bodies that are not valid UTF-8 are delivered as an
  /// empty string.
  pub body:   String,
}

impl FetchResponse {
  pub fn new(status: u16, body: impl Into<String>) -> Self {
    Self { status, body: body.into() }
  }

  pub fn is_ok(&self) -> bool { self.status == STATUS_OK }
}

#[derive(Debug, Error)]
pub enum FetchError {
  /// DNS failure, refused connection, timeout, TLS error or a body that could
  /// not be read.
  #[error("{url} is unreachable: {reason}")]
  Unreachable { url: String, reason: String },
}

/// Performs a GET against a candidate URL.
pub trait UrlFetcher: Send + Sync {
  fn fetch<'a>(
    &'a self,
    url: &'a Url,
  ) -> impl Future<Output = Result<FetchResponse, FetchError>> + Send + 'a;
}

// ─── StaticFetcher ───────────────────────────────────────────────────────────

/// A fetcher that answers from an in-memory table. URLs without an entry are
/// unreachable.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
  responses: HashMap<String, FetchResponse>,
}

impl StaticFetcher {
  pub fn new() -> Self { Self::default() }

  /// Builder-style [`insert`](Self::insert).
  pub fn with(mut self, url: &str, status: u16, body: impl Into<String>) -> Self {
    self.insert(url, status, body);
    self
  }

  /// Register the response for `url`. The key is normalised the same way
  /// [`Url`] serialises, so `http://example.com` and `http://example.com/`
  /// share an entry.
  pub fn insert(&mut self, url: &str, status: u16, body: impl Into<String>) {
    let key = Url::parse(url).map(String::from).unwrap_or_else(|_| url.to_owned());
    self.responses.insert(key, FetchResponse::new(status, body));
  }
}

impl UrlFetcher for StaticFetcher {
  async fn fetch(&self, url: &Url) -> Result<FetchResponse, FetchError> {
    self
      .responses
      .get(url.as_str())
      .cloned()
      .ok_or_else(|| FetchError::Unreachable {
        url:    url.to_string(),
        reason: "no response registered".to_owned(),
      })
  }
}
