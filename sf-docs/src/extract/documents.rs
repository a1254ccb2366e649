//! Non-HTML formats: PDF, Markdown, and plain text.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};

use super::html::normalize_text;
use crate::error::{Result, SfDocsError};

/// PDF parsing is CPU-bound and may panic on malformed files, so it runs
/// on the blocking pool where a panic surfaces as a join error.
pub async fn pdf_text(bytes: Vec<u8>) -> Result<String> {
    let raw = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| SfDocsError::Extraction(format!("PDF parser crashed: {e}")))?
        .map_err(|e| SfDocsError::Extraction(format!("PDF parse failed: {e}")))?;
    Ok(normalize_text(&raw))
}

/// Flatten Markdown to text, returning the first heading as the title.
pub fn markdown_text(markdown: &str) -> (Option<String>, String) {
    let mut out = String::new();
    let mut title: Option<String> = None;
    let mut heading: Option<String> = None;

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading { .. }) => heading = Some(String::new()),
            Event::End(TagEnd::Heading(_)) => {
                if let Some(text) = heading.take()
                    && title.is_none()
                    && !text.trim().is_empty()
                {
                    title = Some(text.trim().to_string());
                }
                out.push_str("\n\n");
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(h) = heading.as_mut() {
                    h.push_str(&text);
                }
                out.push_str(&text);
            }
            Event::SoftBreak => out.push(' '),
            Event::HardBreak => out.push('\n'),
            Event::End(TagEnd::Paragraph | TagEnd::Item | TagEnd::CodeBlock | TagEnd::TableRow) => {
                out.push_str("\n\n");
            }
            Event::End(TagEnd::TableCell) => out.push(' '),
            _ => {}
        }
    }

    (title, normalize_text(&out))
}

pub fn plain_text(text: &str) -> String {
    normalize_text(text)
}
