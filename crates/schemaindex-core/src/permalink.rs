//! Permanent URLs: stable short links under an organization's namespace that
//! redirect to a schema or one of its definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Path prefix under which permanent URLs are served.
pub const PATH_PREFIX: &str = "o";

/// What a permanent URL points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum PermanentUrlTarget {
  Schema(Uuid),
  SchemaRef(Uuid),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermanentUrl {
  pub permanent_url_id: Uuid,
  /// Absolute URL, e.g. `https://schemas.example/o/acme/compose`.
  pub url:              String,
  /// The schema this link belongs to, whatever its target.
  pub schema_id:        Uuid,
  pub target:           PermanentUrlTarget,
  pub created_by:       Uuid,
  pub created_at:       DateTime<Utc>,
}

impl PermanentUrl {
  /// Path of the public page the link redirects to.
  pub fn location(&self) -> String {
    match self.target {
      PermanentUrlTarget::Schema(id) => format!("/schemas/{id}"),
      PermanentUrlTarget::SchemaRef(ref_id) => {
        format!("/schemas/{}/definitions/{ref_id}", self.schema_id)
      }
    }
  }
}

/// Input to [`crate::store::RegistryStore::add_permanent_url`].
#[derive(Debug, Clone)]
pub struct NewPermanentUrl {
  pub url:        String,
  pub schema_id:  Uuid,
  pub target:     PermanentUrlTarget,
  pub created_by: Uuid,
}

/// Slugs are non-empty runs of lowercase ASCII letters, digits and `-`.
pub fn validate_slug(slug: &str) -> Result<()> {
  let ok = !slug.is_empty()
    && slug
      .bytes()
      .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
  if ok { Ok(()) } else { Err(Error::InvalidSlug(slug.to_owned())) }
}

/// `{site_url}/o/{org_slug}/{slug}`; a trailing slash on `site_url` is
/// ignored.
pub fn build_permanent_url(site_url: &str, org_slug: &str, slug: &str) -> String {
  format!(
    "{}/{PATH_PREFIX}/{org_slug}/{slug}",
    site_url.trim_end_matches('/')
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn slug_rules() {
    assert!(validate_slug("compose-file-v2").is_ok());
    assert!(validate_slug("").is_err());
    assert!(validate_slug("Compose").is_err());
    assert!(validate_slug("a/b").is_err());
    assert!(matches!(validate_slug("a b"), Err(Error::InvalidSlug(s)) if s == "a b"));
  }

  #[test]
  fn url_joins_site_org_and_slug() {
    assert_eq!(
      build_permanent_url("https://schemas.example/", "acme", "compose"),
      "https://schemas.example/o/acme/compose"
    );
    assert_eq!(
      build_permanent_url("http://localhost:8080", "acme", "x"),
      "http://localhost:8080/o/acme/x"
    );
  }

  #[test]
  fn location_points_at_public_page() {
    let schema_id = Uuid::new_v4();
    let ref_id = Uuid::new_v4();
    let mut link = PermanentUrl {
      permanent_url_id: Uuid::new_v4(),
      url: "https://schemas.example/o/acme/x".into(),
      schema_id,
      target: PermanentUrlTarget::Schema(schema_id),
      created_by: Uuid::new_v4(),
      created_at: Utc::now(),
    };
    assert_eq!(link.location(), format!("/schemas/{schema_id}"));

    link.target = PermanentUrlTarget::SchemaRef(ref_id);
    assert_eq!(
      link.location(),
      format!("/schemas/{schema_id}/definitions/{ref_id}")
    );
  }

  #[test]
  fn target_serialises_with_kind() {
    let id = Uuid::nil();
    let json = serde_json::to_value(PermanentUrlTarget::SchemaRef(id)).unwrap();
    assert_eq!(json["kind"], "schema_ref");
    assert_eq!(json["id"], id.to_string());
  }
}
