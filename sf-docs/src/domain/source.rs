use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::SourceId;
use crate::error::{Result, SfDocsError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Source {
    pub locator: String,
    pub kind: SourceKind,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    WebPage,
    Pdf,
    Markdown,
    Text,
}

impl SourceKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WebPage => "web_page",
            Self::Pdf => "pdf",
            Self::Markdown => "markdown",
            Self::Text => "text",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Source {
    /// Stable key for this source in the store.
    pub fn id(&self) -> SourceId {
        SourceId::from_key(&self.locator)
    }

    /// Classify a locator as a remote page, a remote PDF, or a local file.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SfDocsError::InvalidSource("empty source".to_string()));
        }

        if input.starts_with("https://") || input.starts_with("http://") {
            let url = reqwest::Url::parse(input)
                .map_err(|e| SfDocsError::InvalidSource(format!("{input}: {e}")))?;
            let kind = if has_extension(url.path(), &["pdf"]) {
                SourceKind::Pdf
            } else {
                SourceKind::WebPage
            };
            return Ok(Self {
                locator: url.to_string(),
                kind,
            });
        }

        let path = PathBuf::from(input);
        if !path.is_file() {
            return Err(SfDocsError::InvalidSource(format!(
                "{input} is neither an http(s) URL nor an existing file"
            )));
        }

        let name = path.to_string_lossy();
        let kind = if has_extension(&name, &["pdf"]) {
            SourceKind::Pdf
        } else if has_extension(&name, &["md", "mdx", "markdown"]) {
            SourceKind::Markdown
        } else if has_extension(&name, &["html", "htm"]) {
            SourceKind::WebPage
        } else {
            SourceKind::Text
        };

        Ok(Self {
            locator: input.to_string(),
            kind,
        })
    }

    pub fn is_remote(&self) -> bool {
        self.locator.starts_with("https://") || self.locator.starts_with("http://")
    }

    pub fn local_path(&self) -> Option<&Path> {
        (!self.is_remote()).then(|| Path::new(&self.locator))
    }

    /// A human-readable fallback title: the file stem or last URL segment.
    pub fn fallback_title(&self) -> String {
        let trimmed = self
            .locator
            .split(['?', '#'])
            .next()
            .unwrap_or(&self.locator)
            .trim_end_matches('/');
        let last = trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed);
        let stem = last.rsplit_once('.').map_or(last, |(stem, _)| stem);
        if stem.is_empty() {
            self.locator.clone()
        } else {
            stem.to_string()
        }
    }
}

fn has_extension(path: &str, extensions: &[&str]) -> bool {
    path.rsplit_once('.')
        .is_some_and(|(_, ext)| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}
