//! Format classification: file extension to language/format tag.
//!
//! Classification is a pure function of the URL path. Each URL-bearing field
//! passes its own [`Allowlist`]; a tag outside the allowlist is treated the
//! same as an unrecognised extension.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};
use url::Url;

// ─── FormatTag ───────────────────────────────────────────────────────────────

/// A recognised specification, documentation or programming language.
///
/// The lowercase name doubles as the syntax-highlighting hint returned to
/// clients and as the value stored in the `format` column.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  AsRefStr,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FormatTag {
  // ── Specification languages ─────────────────────────────────────────────
  Json,
  JsonLd,
  Yaml,
  Xml,
  Cddl,
  Protobuf,
  GraphQl,
  Thrift,
  Toml,
  Turtle,

  // ── Documentation ───────────────────────────────────────────────────────
  Markdown,
  PlainText,
  Html,
  Rst,

  // ── General-purpose ─────────────────────────────────────────────────────
  Python,
  JavaScript,
  TypeScript,
  Rust,
  Go,
  Java,
  C,
  Cpp,
  CSharp,
  Ruby,
  Bash,
  Sql,
}

impl FormatTag {
  /// Map a file extension (without the leading dot) to a tag.
  /// Matching is ASCII case-insensitive.
  pub fn from_extension(ext: &str) -> Option<Self> {
    let tag = match ext.to_ascii_lowercase().as_str() {
      "json" => Self::Json,
      "jsonld" => Self::JsonLd,
      "yaml" | "yml" => Self::Yaml,
      "xml" | "xsd" => Self::Xml,
      "cddl" => Self::Cddl,
      "proto" => Self::Protobuf,
      "graphql" | "gql" => Self::GraphQl,
      "thrift" => Self::Thrift,
      "toml" => Self::Toml,
      "ttl" => Self::Turtle,
      "md" | "markdown" => Self::Markdown,
      "txt" | "text" => Self::PlainText,
      "html" | "htm" => Self::Html,
      "rst" => Self::Rst,
      "py" => Self::Python,
      "js" | "mjs" | "cjs" => Self::JavaScript,
      "ts" => Self::TypeScript,
      "rs" => Self::Rust,
      "go" => Self::Go,
      "java" => Self::Java,
      "c" | "h" => Self::C,
      "cpp" | "cc" | "cxx" | "hpp" => Self::Cpp,
      "cs" => Self::CSharp,
      "rb" => Self::Ruby,
      "sh" | "bash" => Self::Bash,
      "sql" => Self::Sql,
      _ => return None,
    };
    Some(tag)
  }
}

// ─── Classification ──────────────────────────────────────────────────────────

/// The extension of the last path segment of `url`, ignoring query and
/// fragment. `None` for an empty segment (path ending in `/`), a segment
/// without a dot, or a dot-file such as `.gitignore`.
pub fn extension(url: &Url) -> Option<&str> {
  let file_name = url.path().rsplit('/').next()?;
  let (stem, ext) = file_name.rsplit_once('.')?;
  if stem.is_empty() || ext.is_empty() {
    return None;
  }
  Some(ext)
}

/// Infer the format of the resource at `url`, restricted to `allowed`.
///
/// Returns `None` if the extension is unrecognised or recognised but not in
/// `allowed`.
pub fn classify(url: &Url, allowed: &[FormatTag]) -> Option<FormatTag> {
  extension(url)
    .and_then(FormatTag::from_extension)
    .filter(|tag| allowed.contains(tag))
}

// ─── Allowlists ──────────────────────────────────────────────────────────────

/// The formats a field accepts, with an optional fallback used when the
/// extension does not classify.
///
/// A field without a fallback rejects unclassifiable URLs; a field with one
/// accepts them as the fallback format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allowlist {
  formats:  &'static [FormatTag],
  fallback: Option<FormatTag>,
}

impl Allowlist {
  pub const fn new(
    formats: &'static [FormatTag],
    fallback: Option<FormatTag>,
  ) -> Self {
    Self { formats, fallback }
  }

  pub fn formats(&self) -> &'static [FormatTag] { self.formats }

  pub fn fallback(&self) -> Option<FormatTag> { self.fallback }

  pub fn contains(&self, tag: FormatTag) -> bool { self.formats.contains(&tag) }

  /// Classify `url` against this allowlist, applying the fallback.
  pub fn resolve(&self, url: &Url) -> Option<FormatTag> {
    classify(url, self.formats).or(self.fallback)
  }
}

/// Schema definition files. No fallback: a definition must be recognisable.
pub const DEFINITION_FORMATS: Allowlist = Allowlist::new(
  &[
    FormatTag::Json,
    FormatTag::JsonLd,
    FormatTag::Yaml,
    FormatTag::Xml,
    FormatTag::Cddl,
    FormatTag::Protobuf,
    FormatTag::GraphQl,
    FormatTag::Thrift,
    FormatTag::Toml,
    FormatTag::Turtle,
  ],
  None,
);

/// README documents.
pub const README_FORMATS: Allowlist =
  Allowlist::new(&[FormatTag::Markdown, FormatTag::PlainText], None);

/// License texts; anything unrecognised is shown as plain text.
pub const LICENSE_FORMATS: Allowlist = Allowlist::new(
  &[FormatTag::Markdown, FormatTag::PlainText, FormatTag::Html],
  Some(FormatTag::PlainText),
);

/// Supplementary documentation (RFCs, W3C pages, example code).
pub const DOCUMENTATION_FORMATS: Allowlist = Allowlist::new(
  &[
    FormatTag::Markdown,
    FormatTag::PlainText,
    FormatTag::Html,
    FormatTag::Rst,
    FormatTag::Json,
    FormatTag::JsonLd,
    FormatTag::Yaml,
    FormatTag::Xml,
    FormatTag::Cddl,
    FormatTag::Protobuf,
    FormatTag::GraphQl,
    FormatTag::Python,
    FormatTag::JavaScript,
    FormatTag::TypeScript,
    FormatTag::Rust,
    FormatTag::Go,
    FormatTag::Java,
    FormatTag::C,
    FormatTag::Cpp,
    FormatTag::CSharp,
    FormatTag::Ruby,
    FormatTag::Bash,
    FormatTag::Sql,
  ],
  Some(FormatTag::PlainText),
);
