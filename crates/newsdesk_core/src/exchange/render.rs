//! Read-only projections of a document.
//!
//! # Responsibility
//! - Render display markup for article detail views.
//! - Derive the plain-text preview stored next to each article.
//!
//! # Invariants
//! - Text content is always HTML-escaped; only structural tags are emitted.
//! - Further sanitization of the markup is the embedder's concern.

use crate::model::document::{Alignment, Block, BlockKind, Document, TextRun};
use once_cell::sync::Lazy;
use regex::Regex;

const PREVIEW_MAX_CHARS: usize = 100;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Renders block markup: `<p>`/`<h1>`..`<h6>` with inline
/// `<strong>`/`<em>`/`<u>`/`<s>` wrappers.
pub fn render_html(document: &Document) -> String {
    let mut html = String::new();
    for block in document.blocks() {
        render_block(block, &mut html);
    }
    html
}

/// Derives the list preview: whitespace collapsed, first 100 characters.
///
/// Returns `None` for documents without visible text.
pub fn derive_preview_text(document: &Document) -> Option<String> {
    let text = document.plain_text();
    let normalized = WHITESPACE_RE.replace_all(&text, " ");
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(PREVIEW_MAX_CHARS).collect())
    }
}

fn render_block(block: &Block, out: &mut String) {
    let tag = match block.kind() {
        BlockKind::Paragraph => "p".to_string(),
        BlockKind::Heading(level) => format!("h{}", level.get()),
    };

    out.push('<');
    out.push_str(&tag);
    if block.align() != Alignment::Left {
        out.push_str(" style=\"text-align:");
        out.push_str(block.align().as_str());
        out.push('"');
    }
    out.push('>');

    if block.is_empty() {
        out.push_str("<br>");
    } else {
        for run in block.runs() {
            render_run(run, out);
        }
    }

    out.push_str("</");
    out.push_str(&tag);
    out.push('>');
}

fn render_run(run: &TextRun, out: &mut String) {
    let wrappers: Vec<&str> = [
        (run.format.bold, "strong"),
        (run.format.italic, "em"),
        (run.format.underline, "u"),
        (run.format.strikethrough, "s"),
    ]
    .into_iter()
    .filter_map(|(enabled, tag)| enabled.then_some(tag))
    .collect();

    for tag in &wrappers {
        out.push('<');
        out.push_str(tag);
        out.push('>');
    }
    escape_into(&run.text, out);
    for tag in wrappers.iter().rev() {
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }
}

fn escape_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
}
