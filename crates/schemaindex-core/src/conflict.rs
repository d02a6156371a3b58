//! Conflict detection: does a candidate definition URL name a file already
//! claimed by another published schema?
//!
//! The detector works on a snapshot of published definition URLs supplied by
//! the caller (see [`crate::store::RegistryStore::published_refs`]). It takes
//! no locks; the storage backend repeats the check inside its publish
//! transaction.

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::provider::UrlInfo;

/// A definition URL belonging to a published schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedRef {
  pub ref_id:      Uuid,
  pub schema_id:   Uuid,
  pub schema_name: String,
  pub url:         String,
}

/// One of a schema's own definition URLs colliding with a published one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
  pub url:      String,
  pub existing: PublishedRef,
}

/// Every entry of `published` that references the same resource as
/// `candidate`, skipping refs owned by `owner_schema_id`.
///
/// Stored URLs that no longer parse are skipped with a warning.
pub fn find_conflicts<'a>(
  candidate: &Url,
  owner_schema_id: Option<Uuid>,
  published: &'a [PublishedRef],
) -> Vec<&'a PublishedRef> {
  let candidate = UrlInfo::from_url(candidate);

  published
    .iter()
    .filter(|existing| Some(existing.schema_id) != owner_schema_id)
    .filter(|existing| match Url::parse(&existing.url) {
      Ok(url) => candidate.same_resource(&UrlInfo::from_url(&url)),
      Err(e) => {
        tracing::warn!(
          ref_id = %existing.ref_id,
          url = %existing.url,
          error = %e,
          "skipping unparseable definition URL"
        );
        false
      }
    })
    .collect()
}

/// Check several of one schema's definition URLs at once, pairing each with
/// every published ref it collides with. Unparseable candidates are skipped.
pub fn collect_conflicts<'u>(
  urls: impl IntoIterator<Item = &'u str>,
  owner_schema_id: Option<Uuid>,
  published: &[PublishedRef],
) -> Vec<Conflict> {
  urls
    .into_iter()
    .filter_map(|raw| Url::parse(raw).ok().map(|url| (raw, url)))
    .flat_map(|(raw, url)| {
      find_conflicts(&url, owner_schema_id, published)
        .into_iter()
        .map(move |existing| Conflict { url: raw.to_owned(), existing: existing.clone() })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn published(schema_id: Uuid, url: &str) -> PublishedRef {
    PublishedRef {
      ref_id: Uuid::new_v4(),
      schema_id,
      schema_name: "Existing".into(),
      url: url.into(),
    }
  }

  fn url(s: &str) -> Url { Url::parse(s).unwrap() }

  #[test]
  fn reports_every_match() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let snapshot = vec![
      published(a, "https://github.com/org/repo/blob/main/s.json"),
      published(b, "https://raw.githubusercontent.com/org/repo/main/s.json"),
      published(b, "https://example.com/other.json"),
    ];

    let found = find_conflicts(
      &url("https://raw.githubusercontent.com/org/repo/refs/heads/main/s.json"),
      None,
      &snapshot,
    );
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].schema_id, a);
    assert_eq!(found[1].schema_id, b);
  }

  #[test]
  fn owner_is_excluded() {
    let owner = Uuid::new_v4();
    let snapshot = vec![published(owner, "https://example.com/s.json")];
    let found =
      find_conflicts(&url("https://example.com/s.json"), Some(owner), &snapshot);
    assert!(found.is_empty());
  }

  #[test]
  fn scheme_change_still_conflicts() {
    let snapshot = vec![published(Uuid::new_v4(), "http://example.com/definiton.json")];
    let found = find_conflicts(
      &url("https://example.com/definiton.json"),
      Some(Uuid::new_v4()),
      &snapshot,
    );
    assert_eq!(found.len(), 1);
  }

  #[test]
  fn collects_pairs_for_each_candidate() {
    let other = Uuid::new_v4();
    let snapshot = vec![
      published(other, "https://github.com/org/repo/blob/main/a.json"),
      published(other, "https://example.com/b.json"),
    ];
    let conflicts = collect_conflicts(
      [
        "https://raw.githubusercontent.com/org/repo/main/a.json",
        "https://example.com/c.json",
        "http://example.com/b.json",
      ],
      None,
      &snapshot,
    );
    assert_eq!(conflicts.len(), 2);
    assert_eq!(conflicts[0].url, "https://raw.githubusercontent.com/org/repo/main/a.json");
    assert_eq!(conflicts[0].existing, snapshot[0]);
    assert_eq!(conflicts[1].existing, snapshot[1]);
  }

  #[test]
  fn unparseable_stored_url_is_skipped() {
    let snapshot = vec![published(Uuid::new_v4(), "not a url")];
    assert!(find_conflicts(&url("https://example.com/s.json"), None, &snapshot).is_empty());
  }
}
