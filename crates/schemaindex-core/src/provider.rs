//! Provider-aware URL normalisation and same-resource comparison.
//!
//! Most hosts serve a file from exactly one location, so two URLs name the
//! same resource when their network location and path agree. GitHub serves
//! the same file from a web-view URL (`github.com/{org}/{repo}/blob/{ref}/…`,
//! or the `…/raw/{ref}/…` alias) and a raw-content URL
//! (`raw.githubusercontent.com/{org}/{repo}/{ref}/…`, where `{ref}` may be
//! spelled `refs/heads/{branch}`). [`UrlInfo`] recognises both shapes and
//! exposes canonical forms so either spelling compares equal.

use url::Url;

/// Host of GitHub's human-facing web view.
pub const WEB_VIEW_HOST: &str = "github.com";

/// Host serving raw file content for GitHub repositories.
pub const RAW_CONTENT_HOST: &str = "raw.githubusercontent.com";

/// Segments that mark a file inside a web-view URL.
const WEB_VIEW_BLOB: &str = "blob";
const WEB_VIEW_RAW: &str = "raw";

// ─── Location ────────────────────────────────────────────────────────────────

/// The part of a URL that identifies a resource: host (with any non-default
/// port) and path. Scheme, query and fragment are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
  pub host: String,
  pub path: String,
}

impl Location {
  pub fn from_url(url: &Url) -> Self {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    let host = match url.port() {
      Some(port) => format!("{host}:{port}"),
      None => host,
    };
    Self { host, path: url.path().to_owned() }
  }
}

// ─── Source-host URLs ────────────────────────────────────────────────────────

/// Which of the provider's URL shapes a URL uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceForm {
  /// `github.com/{org}/{repo}/blob/{ref}/{path…}` (or any other web page).
  WebView,
  /// `github.com/{org}/{repo}/raw/{ref}/{path…}`.
  RawAlias,
  /// `raw.githubusercontent.com/{org}/{repo}/{ref}/{path…}`.
  RawContent,
}

/// The pieces of a provider URL that point at a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileParts<'a> {
  pub org:     &'a str,
  pub repo:    &'a str,
  pub git_ref: &'a str,
  pub path:    &'a [String],
}

/// A URL hosted by the source-hosting provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceHostUrl {
  location: Location,
  form:     SourceForm,
  /// Non-empty path segments, in order.
  segments: Vec<String>,
}

impl SourceHostUrl {
  pub fn form(&self) -> SourceForm { self.form }

  pub fn location(&self) -> &Location { &self.location }

  /// Split the path into org, repo, ref and file path.
  ///
  /// Web-view URLs need at least five segments and a `blob`/`raw` marker;
  /// raw-content URLs need at least four. A leading `refs/heads/` or
  /// `refs/tags/` on the ref is dropped when a file path follows it.
  pub fn file_parts(&self) -> Option<FileParts<'_>> {
    let s = &self.segments;
    let (org, repo, rest) = match self.form {
      SourceForm::WebView | SourceForm::RawAlias => {
        if s.len() < 5 || !matches!(s[2].as_str(), WEB_VIEW_BLOB | WEB_VIEW_RAW)
        {
          return None;
        }
        (&s[0], &s[1], &s[3..])
      }
      SourceForm::RawContent => {
        if s.len() < 4 {
          return None;
        }
        (&s[0], &s[1], &s[2..])
      }
    };

    let rest = match rest {
      [refs, kind, tail @ ..]
        if refs == "refs"
          && matches!(kind.as_str(), "heads" | "tags")
          && tail.len() >= 2 =>
      {
        tail
      }
      _ => rest,
    };

    let (git_ref, path) = rest.split_first()?;
    if path.is_empty() {
      return None;
    }
    Some(FileParts { org, repo, git_ref, path })
  }

  /// The raw-content URL for this resource.
  ///
  /// Always available for raw-content URLs; available for web-view URLs only
  /// when they point at a file.
  pub fn raw_form(&self) -> Option<String> {
    if let Some(p) = self.file_parts() {
      return Some(format!(
        "https://{RAW_CONTENT_HOST}/{}/{}/{}/{}",
        p.org,
        p.repo,
        p.git_ref,
        p.path.join("/")
      ));
    }
    match self.form {
      SourceForm::RawContent => Some(format!(
        "https://{RAW_CONTENT_HOST}/{}",
        self.segments.join("/")
      )),
      SourceForm::WebView | SourceForm::RawAlias => None,
    }
  }

  /// The web-view URL for this resource, with the `raw` alias rewritten to
  /// `blob`.
  ///
  /// Always available for web-view URLs; available for raw-content URLs
  /// only when they point at a file.
  pub fn web_view_form(&self) -> Option<String> {
    if let Some(p) = self.file_parts() {
      return Some(format!(
        "https://{WEB_VIEW_HOST}/{}/{}/{WEB_VIEW_BLOB}/{}/{}",
        p.org,
        p.repo,
        p.git_ref,
        p.path.join("/")
      ));
    }
    match self.form {
      SourceForm::WebView | SourceForm::RawAlias => Some(format!(
        "https://{WEB_VIEW_HOST}/{}",
        self.segments.join("/")
      )),
      SourceForm::RawContent => None,
    }
  }

  fn has_canonical_form(&self) -> bool {
    self.raw_form().is_some() || self.web_view_form().is_some()
  }
}

// ─── UrlInfo ─────────────────────────────────────────────────────────────────

/// A URL classified by hosting provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlInfo {
  Generic(Location),
  SourceHost(SourceHostUrl),
}

impl UrlInfo {
  pub fn from_url(url: &Url) -> Self {
    let location = Location::from_url(url);
    let segments: Vec<String> = url
      .path_segments()
      .map(|segs| segs.filter(|s| !s.is_empty()).map(str::to_owned).collect())
      .unwrap_or_default();

    let form = match location.host.as_str() {
      WEB_VIEW_HOST | "www.github.com" => {
        if segments.get(2).is_some_and(|s| s == WEB_VIEW_RAW) {
          SourceForm::RawAlias
        } else {
          SourceForm::WebView
        }
      }
      RAW_CONTENT_HOST => SourceForm::RawContent,
      _ => return Self::Generic(location),
    };
    Self::SourceHost(SourceHostUrl { location, form, segments })
  }

  pub fn location(&self) -> &Location {
    match self {
      Self::Generic(location) => location,
      Self::SourceHost(source) => source.location(),
    }
  }

  /// Whether `self` and `other` reference the same underlying file.
  ///
  /// Symmetric. Provider URLs compare by raw-content form when both have
  /// one, otherwise by web-view form; a provider URL never matches a URL on
  /// another host unless neither side yields a canonical form.
  pub fn same_resource(&self, other: &Self) -> bool {
    match (self, other) {
      (Self::Generic(a), Self::Generic(b)) => a == b,
      (Self::SourceHost(a), Self::SourceHost(b)) => {
        if let (Some(x), Some(y)) = (a.raw_form(), b.raw_form()) {
          return x == y;
        }
        if let (Some(x), Some(y)) = (a.web_view_form(), b.web_view_form()) {
          return x == y;
        }
        a.location == b.location
      }
      (Self::SourceHost(source), Self::Generic(location))
      | (Self::Generic(location), Self::SourceHost(source)) => {
        !source.has_canonical_form() && source.location() == location
      }
    }
  }
}

/// Whether `a` and `b` reference the same underlying file.
pub fn is_same_resource(a: &Url, b: &Url) -> bool {
  UrlInfo::from_url(a).same_resource(&UrlInfo::from_url(b))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn url(s: &str) -> Url { Url::parse(s).unwrap() }

  fn source(s: &str) -> SourceHostUrl {
    match UrlInfo::from_url(&url(s)) {
      UrlInfo::SourceHost(source) => source,
      other => panic!("expected provider URL, got {other:?}"),
    }
  }

  fn same(a: &str, b: &str) -> bool {
    let forward = is_same_resource(&url(a), &url(b));
    let backward = is_same_resource(&url(b), &url(a));
    assert_eq!(forward, backward, "asymmetric for {a} / {b}");
    forward
  }

  // ── Classification ──────────────────────────────────────────────────────

  #[test]
  fn recognises_provider_forms() {
    assert_eq!(
      source("https://github.com/org/repo/blob/main/a.json").form(),
      SourceForm::WebView
    );
    assert_eq!(
      source("https://github.com/org/repo/raw/main/a.json").form(),
      SourceForm::RawAlias
    );
    assert_eq!(
      source("https://raw.githubusercontent.com/org/repo/main/a.json").form(),
      SourceForm::RawContent
    );
    assert!(matches!(
      UrlInfo::from_url(&url("https://gitlab.com/org/repo/-/blob/main/a.json")),
      UrlInfo::Generic(_)
    ));
  }

  // ── Canonical forms ─────────────────────────────────────────────────────

  #[test]
  fn web_view_converts_to_raw_and_back() {
    let original = "https://github.com/org/repo/blob/branchname/path/to/file.json";
    let raw = source(original).raw_form().unwrap();
    assert_eq!(
      raw,
      "https://raw.githubusercontent.com/org/repo/branchname/path/to/file.json"
    );
    assert_eq!(source(&raw).web_view_form().unwrap(), original);
  }

  #[test]
  fn permalink_prefix_is_dropped() {
    let s = source(
      "https://raw.githubusercontent.com/org/repo/refs/heads/branchname/path/to/file.json",
    );
    assert_eq!(
      s.raw_form().unwrap(),
      "https://raw.githubusercontent.com/org/repo/branchname/path/to/file.json"
    );
    assert_eq!(
      s.web_view_form().unwrap(),
      "https://github.com/org/repo/blob/branchname/path/to/file.json"
    );
  }

  #[test]
  fn short_paths_have_no_conversion() {
    // Four segments: not enough for web-view → raw.
    let web = source("https://github.com/org/repo/blob/main");
    assert_eq!(web.raw_form(), None);
    assert_eq!(
      web.web_view_form().as_deref(),
      Some("https://github.com/org/repo/blob/main")
    );

    // Three segments: not enough for raw → web-view.
    let raw = source("https://raw.githubusercontent.com/org/repo/main");
    assert_eq!(raw.web_view_form(), None);
    assert!(raw.raw_form().is_some());
  }

  #[test]
  fn tree_pages_do_not_convert() {
    let s = source("https://github.com/org/repo/tree/main/schemas");
    assert_eq!(s.file_parts(), None);
    assert_eq!(s.raw_form(), None);
  }

  // ── Same-resource comparison ────────────────────────────────────────────

  #[test]
  fn web_view_matches_raw_content() {
    assert!(same(
      "https://github.com/org/repo/blob/branchname/path/to/file.json",
      "https://raw.githubusercontent.com/org/repo/branchname/path/to/file.json",
    ));
  }

  #[test]
  fn permalink_matches_web_view() {
    assert!(same(
      "https://raw.githubusercontent.com/org/repo/refs/heads/branchname/path/to/file.json",
      "https://github.com/org/repo/blob/branchname/path/to/file.json",
    ));
  }

  #[test]
  fn raw_alias_matches_raw_content() {
    assert!(same(
      "https://github.com/org/repo/raw/branchname/path/to/file.json",
      "https://raw.githubusercontent.com/org/repo/branchname/path/to/file.json",
    ));
  }

  #[test]
  fn different_branches_differ() {
    assert!(!same(
      "https://github.com/org/repo/blob/main/file.json",
      "https://raw.githubusercontent.com/org/repo/dev/file.json",
    ));
  }

  #[test]
  fn repository_pages_compare_by_web_view() {
    assert!(same("https://github.com/org/repo", "http://github.com/org/repo/"));
    assert!(!same("https://github.com/org/repo", "https://github.com/org/other"));
  }

  #[test]
  fn provider_never_matches_other_host() {
    assert!(!same(
      "https://github.com/org/repo/blob/main/file.json",
      "https://example.com/org/repo/blob/main/file.json",
    ));
  }

  #[test]
  fn generic_ignores_scheme_query_and_fragment() {
    assert!(same(
      "http://example.com/schema.json",
      "https://example.com/schema.json?v=2#top"
    ));
    assert!(same("https://EXAMPLE.com/schema.json", "https://example.com/schema.json"));
  }

  #[test]
  fn generic_distinguishes_paths_and_ports() {
    assert!(!same("https://example.com/a.json", "https://example.com/b.json"));
    assert!(!same("https://example.com/a.json", "https://example.com:8443/a.json"));
    assert!(!same("https://example.com/a.json", "https://example.org/a.json"));
  }
}
