//! ETag computation for schema detail responses.
//!
//! ETags are SHA-256 hashes over the sorted (id, timestamp) pairs of the
//! schema and everything attached to it. Any added, removed or replaced row
//! changes the tag; ordering of the input does not.

use axum::http::{HeaderMap, header};
use chrono::{DateTime, Utc};
use schemaindex_core::schema::SchemaDetail;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Compute a strong ETag for `detail`.
pub fn detail_etag(detail: &SchemaDetail) -> String {
  let schema = &detail.schema;
  let mut pairs: Vec<(Uuid, DateTime<Utc>)> = vec![(schema.schema_id, schema.updated_at)];
  if let Some(published_at) = schema.published_at {
    // Distinguishes "published" from "draft" for the same row.
    pairs.push((Uuid::nil(), published_at));
  }
  pairs.extend(detail.definitions.iter().map(|r| (r.ref_id, r.created_at)));
  pairs.extend(detail.documentation.iter().map(|d| (d.item_id, d.created_at)));
  pairs.extend(
    detail
      .permanent_urls
      .iter()
      .map(|p| (p.permanent_url_id, p.created_at)),
  );
  etag_from_pairs(&mut pairs)
}

/// Compute an ETag directly from (id, timestamp) pairs.
///
/// The slice is sorted in-place for determinism.
pub fn etag_from_pairs(pairs: &mut [(Uuid, DateTime<Utc>)]) -> String {
  pairs.sort();

  let mut hasher = Sha256::new();
  for (id, ts) in pairs.iter() {
    hasher.update(id.as_bytes());
    hasher.update(ts.timestamp_micros().to_le_bytes());
  }
  format!("\"{}\"", hex::encode(hasher.finalize()))
}

/// Whether `If-None-Match` in `headers` matches `etag` (weak comparison).
pub fn if_none_match(headers: &HeaderMap, etag: &str) -> bool {
  headers
    .get_all(header::IF_NONE_MATCH)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(','))
    .map(str::trim)
    .any(|candidate| candidate == "*" || candidate.trim_start_matches("W/") == etag)
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;
  use chrono::TimeZone;

  use super::*;

  fn ts(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

  #[test]
  fn insertion_order_does_not_matter() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let mut one = vec![(a, ts(1000)), (b, ts(2000))];
    let mut two = vec![(b, ts(2000)), (a, ts(1000))];
    assert_eq!(etag_from_pairs(&mut one), etag_from_pairs(&mut two));
  }

  #[test]
  fn changed_timestamp_changes_etag() {
    let a = Uuid::new_v4();
    assert_ne!(
      etag_from_pairs(&mut [(a, ts(1000))]),
      etag_from_pairs(&mut [(a, ts(1001))])
    );
  }

  #[test]
  fn if_none_match_accepts_lists_and_weak_tags() {
    let etag = "\"abc\"";
    let mut headers = HeaderMap::new();
    assert!(!if_none_match(&headers, etag));

    headers.insert(header::IF_NONE_MATCH, HeaderValue::from_static("\"x\", W/\"abc\""));
    assert!(if_none_match(&headers, etag));

    headers.insert(header::IF_NONE_MATCH, HeaderValue::from_static("*"));
    assert!(if_none_match(&headers, etag));
  }
}
