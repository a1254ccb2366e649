use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DocId, Source, SourceId, SourceKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub source: Source,
    pub title: String,
    pub text: String,
    pub content_hash: String,
    pub strategy: ExtractionStrategy,
    pub final_url: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl Document {
    pub fn new(
        source: Source,
        title: impl Into<String>,
        text: String,
        strategy: ExtractionStrategy,
    ) -> Self {
        let content_hash = content_hash(&text);
        Self {
            id: DocId::from_key(&source.locator),
            source,
            title: title.into(),
            text,
            content_hash,
            strategy,
            final_url: None,
            fetched_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_final_url(mut self, url: impl Into<String>) -> Self {
        self.final_url = Some(url.into());
        self
    }
}

pub fn content_hash(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

/// How the text of a document was obtained.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    DocsApi,
    StaticDom,
    Readability,
    Iframe,
    Pdf,
    Markdown,
    PlainText,
}

impl ExtractionStrategy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DocsApi => "docs_api",
            Self::StaticDom => "static_dom",
            Self::Readability => "readability",
            Self::Iframe => "iframe",
            Self::Pdf => "pdf",
            Self::Markdown => "markdown",
            Self::PlainText => "plain_text",
        }
    }
}

impl std::fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the store holds for one ingested source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedSource {
    pub id: SourceId,
    pub source: String,
    pub kind: SourceKind,
    pub title: String,
    pub content_hash: String,
    pub chunk_count: usize,
    pub strategy: ExtractionStrategy,
    pub ingested_at: DateTime<Utc>,
}
