//! README rendering.
//!
//! Markdown goes through `pulldown-cmark` with raw HTML demoted to text, so
//! a README can format itself but cannot inject markup. Plain text becomes
//! an escaped `<pre>` block.

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html};
use schemaindex_core::schema::DocumentationFormat;

/// Render `body` according to its stored format. Items without a format are
/// shown as plain text.
pub fn render(format: Option<DocumentationFormat>, body: &str) -> String {
  match format {
    Some(DocumentationFormat::Markdown) => markdown_to_html(body),
    Some(DocumentationFormat::PlainText) | None => plaintext_to_html(body),
  }
}

pub fn markdown_to_html(markdown: &str) -> String {
  let mut opts = Options::empty();
  opts.insert(Options::ENABLE_TABLES);
  opts.insert(Options::ENABLE_STRIKETHROUGH);

  let parser = Parser::new_ext(markdown, opts).map(|event| match event {
    Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
    Event::Start(Tag::Link { link_type, dest_url, title, id }) if is_script_url(&dest_url) => {
      Event::Start(Tag::Link { link_type, dest_url: CowStr::Borrowed("#"), title, id })
    }
    Event::Start(Tag::Image { link_type, dest_url, title, id }) if is_script_url(&dest_url) => {
      Event::Start(Tag::Image { link_type, dest_url: CowStr::Borrowed(""), title, id })
    }
    other => other,
  });

  let mut out = String::with_capacity(markdown.len() * 3 / 2);
  html::push_html(&mut out, parser);
  out
}

pub fn plaintext_to_html(text: &str) -> String {
  let events = [
    Event::Start(Tag::CodeBlock(CodeBlockKind::Indented)),
    Event::Text(CowStr::Borrowed(text)),
    Event::End(TagEnd::CodeBlock),
  ];
  let mut out = String::with_capacity(text.len() + 24);
  html::push_html(&mut out, events.into_iter());
  out
}

fn is_script_url(url: &str) -> bool {
  let Some((scheme, _)) = url.trim_start().split_once(':') else {
    return false;
  };
  matches!(
    scheme.to_ascii_lowercase().as_str(),
    "javascript" | "vbscript" | "data"
  )
}
