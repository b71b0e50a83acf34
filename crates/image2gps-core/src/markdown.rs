//! Markdown-to-HTML rendering for the streamed description.
//!
//! The description only uses headings, bold text, and bullet lists, but the
//! renderer accepts any `CommonMark`. Raw HTML in the source is escaped and
//! shown as text, never passed through.

use pulldown_cmark::{Event, Options, Parser, html};

/// Render `markdown` to an HTML fragment.
///
/// A partially revealed document is fine: unterminated emphasis renders as
/// literal asterisks until the closing marker streams in.
pub fn render_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::empty()).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut out = String::with_capacity(markdown.len());
    html::push_html(&mut out, parser);
    out
}
