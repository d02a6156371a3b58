//! The validation orchestrator.
//!
//! Each URL-bearing field runs through the same steps:
//!
//! 1. parse: only absolute `http`/`https` URLs are accepted
//! 2. fetch: a transport failure rejects as [`Rejection::Unreachable`]
//! 3. status: anything but `200 OK` rejects
//! 4. content: an empty body rejects
//! 5. format: classify against the field's [`Allowlist`]
//! 6. conflict: definition URLs only, and only when a [`ConflictScope`] is
//!    supplied (the owning schema is, or is about to be, published)
//!
//! Rejections are values, not errors: a submission validates every field and
//! reports all of them together as [`FieldErrors`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::{
  conflict::{PublishedRef, find_conflicts},
  fetch::UrlFetcher,
  format::{
    Allowlist, DEFINITION_FORMATS, DOCUMENTATION_FORMATS, FormatTag,
    LICENSE_FORMATS, README_FORMATS,
  },
};

// ─── Field kinds ─────────────────────────────────────────────────────────────

/// The purpose of a URL-bearing field; selects allowlist and conflict policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
  Definition,
  Readme,
  License,
  Documentation,
}

impl FieldKind {
  pub fn allowlist(self) -> &'static Allowlist {
    match self {
      Self::Definition => &DEFINITION_FORMATS,
      Self::Readme => &README_FORMATS,
      Self::License => &LICENSE_FORMATS,
      Self::Documentation => &DOCUMENTATION_FORMATS,
    }
  }

  /// Only definition URLs must be globally unique among published schemas.
  pub fn checks_conflicts(self) -> bool { matches!(self, Self::Definition) }
}

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// A URL that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
  pub url:    Url,
  pub format: FormatTag,
}

/// Why a URL was rejected. `Display` is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Rejection {
  #[error("Enter a valid http or https URL.")]
  InvalidUrl,

  #[error("The provided URL could not be reached.")]
  Unreachable,

  #[error("The provided URL responded with HTTP status {status}.")]
  BadStatus { status: u16 },

  #[error("The provided URL returned no content.")]
  EmptyContent,

  #[error(
    "The file at the provided URL is not in a supported format (expected one of: {}).",
    join_formats(.allowed)
  )]
  UnsupportedFormat { allowed: Vec<FormatTag> },

  #[error("The provided URL is already in use by another Schema.")]
  DuplicateResource { conflicts: Vec<PublishedRef> },
}

impl Rejection {
  /// Stable machine-readable reason code.
  pub fn code(&self) -> &'static str {
    match self {
      Self::InvalidUrl => "invalid_url",
      Self::Unreachable => "unreachable",
      Self::BadStatus { .. } => "bad_status",
      Self::EmptyContent => "empty_content",
      Self::UnsupportedFormat { .. } => "unsupported_format",
      Self::DuplicateResource { .. } => "duplicate_resource",
    }
  }
}

fn join_formats(formats: &[FormatTag]) -> String {
  formats.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

// ─── Field errors ────────────────────────────────────────────────────────────

/// Identifies a URL-bearing field within a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPath {
  Definition(usize),
  Readme,
  License,
  Documentation(usize),
}

impl fmt::Display for FieldPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Definition(i) => write!(f, "definitions[{i}].url"),
      Self::Readme => f.write_str("readme.url"),
      Self::License => f.write_str("license.url"),
      Self::Documentation(i) => write!(f, "documentation[{i}].url"),
    }
  }
}

impl Serialize for FieldPath {
  fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(self)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
  pub field:     FieldPath,
  pub rejection: Rejection,
}

/// All rejections of one submission, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
  pub fn push(&mut self, field: FieldPath, rejection: Rejection) {
    self.0.push(FieldError { field, rejection });
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn iter(&self) -> impl Iterator<Item = &FieldError> { self.0.iter() }

  pub fn get(&self, field: FieldPath) -> Option<&Rejection> {
    self.0.iter().find(|e| e.field == field).map(|e| &e.rejection)
  }
}

impl fmt::Display for FieldErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, e) in self.0.iter().enumerate() {
      if i > 0 {
        f.write_str("; ")?;
      }
      write!(f, "{}: {}", e.field, e.rejection)?;
    }
    Ok(())
  }
}

// ─── Orchestrator ────────────────────────────────────────────────────────────

/// Published definitions a candidate must not collide with.
#[derive(Debug, Clone, Copy)]
pub struct ConflictScope<'a> {
  /// The schema being validated; its own refs never conflict.
  pub owner_schema_id: Option<Uuid>,
  pub published:       &'a [PublishedRef],
}

/// Run the conflict step on its own. Used by the publish workflow, which
/// re-checks stored definitions without fetching them again.
pub fn check_conflict(url: &Url, scope: &ConflictScope<'_>) -> Result<(), Rejection> {
  let conflicts = find_conflicts(url, scope.owner_schema_id, scope.published);
  if conflicts.is_empty() {
    Ok(())
  } else {
    Err(Rejection::DuplicateResource {
      conflicts: conflicts.into_iter().cloned().collect(),
    })
  }
}

/// Validates URL fields with a borrowed fetcher.
pub struct Validator<'a, F> {
  fetcher: &'a F,
  scope:   Option<ConflictScope<'a>>,
}

impl<'a, F: UrlFetcher> Validator<'a, F> {
  pub fn new(fetcher: &'a F) -> Self { Self { fetcher, scope: None } }

  /// Enable the conflict step for definition fields.
  pub fn with_conflict_scope(mut self, scope: ConflictScope<'a>) -> Self {
    self.scope = Some(scope);
    self
  }

  /// Validate one field. Performs exactly one fetch for a parseable URL.
  pub async fn validate(
    &self,
    raw_url: &str,
    kind: FieldKind,
  ) -> Result<Accepted, Rejection> {
    let url = parse_http_url(raw_url).ok_or(Rejection::InvalidUrl)?;

    tracing::debug!(%url, ?kind, "fetching candidate URL");
    let response = self.fetcher.fetch(&url).await.map_err(|e| {
      tracing::debug!(error = %e, "candidate URL unreachable");
      Rejection::Unreachable
    })?;

    if !response.is_ok() {
      return Err(Rejection::BadStatus { status: response.status });
    }
    if response.body.is_empty() {
      return Err(Rejection::EmptyContent);
    }

    let allowlist = kind.allowlist();
    let format = allowlist.resolve(&url).ok_or_else(|| {
      Rejection::UnsupportedFormat { allowed: allowlist.formats().to_vec() }
    })?;

    if kind.checks_conflicts()
      && let Some(scope) = &self.scope
    {
      check_conflict(&url, scope)?;
    }

    tracing::debug!(%url, %format, "candidate URL accepted");
    Ok(Accepted { url, format })
  }
}

/// Parse `raw` as an absolute `http`/`https` URL with a host.
pub fn parse_http_url(raw: &str) -> Option<Url> {
  let url = Url::parse(raw.trim()).ok()?;
  let web = matches!(url.scheme(), "http" | "https") && url.host_str().is_some();
  web.then_some(url)
}
