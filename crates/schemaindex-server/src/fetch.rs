//! `reqwest`-backed [`UrlFetcher`].

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap};
use schemaindex_core::fetch::{FetchError, FetchResponse, UrlFetcher};
use url::Url;

use crate::error::Result;

/// Performs one GET per call with a fixed timeout and no retries.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
  client: reqwest::Client,
}

impl ReqwestFetcher {
  pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .user_agent(user_agent)
      .build()?;
    Ok(Self { client })
  }
}

fn unreachable(url: &Url, err: reqwest::Error) -> FetchError {
  FetchError::Unreachable { url: url.to_string(), reason: err.to_string() }
}

/// The `charset` parameter of the response's `Content-Type`, if any.
fn declared_charset(headers: &HeaderMap) -> Option<String> {
  let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;
  content_type.split(';').skip(1).find_map(|param| {
    let (key, value) = param.split_once('=')?;
    key
      .trim()
      .eq_ignore_ascii_case("charset")
      .then(|| value.trim().trim_matches('"').to_ascii_lowercase())
  })
}

impl UrlFetcher for ReqwestFetcher {
  async fn fetch(&self, url: &Url) -> Result<FetchResponse, FetchError> {
    let resp = self
      .client
      .get(url.clone())
      .send()
      .await
      .map_err(|e| unreachable(url, e))?;
    let status = resp.status().as_u16();

    let body = match declared_charset(resp.headers()) {
      Some(charset) if charset != "utf-8" && charset != "utf8" => {
        resp.text().await.map_err(|e| unreachable(url, e))?
      }
      // Undeclared or UTF-8: invalid bodies count as empty.
      _ => {
        let bytes = resp.bytes().await.map_err(|e| unreachable(url, e))?;
        String::from_utf8(bytes.to_vec()).unwrap_or_default()
      }
    };
    tracing::debug!(%url, status, len = body.len(), "fetched");
    Ok(FetchResponse { status, body })
  }
}
