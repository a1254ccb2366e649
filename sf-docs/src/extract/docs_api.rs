//! The JSON endpoints behind developer.salesforce.com atlas pages.
//!
//! Atlas pages render their body inside a web component that loads it from
//! `get_document_content`, so the static HTML holds little more than the
//! navigation shell.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;
use serde::Deserialize;

use crate::error::{Result, SfDocsError};

static ATLAS_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^/docs/atlas\.(?P<locale>[a-z]{2}-[a-z]{2})\.(?:(?P<version>\d+\.\d+)\.)?(?P<deliverable>[A-Za-z0-9_]+)\.meta/[A-Za-z0-9_]+/(?P<page>[^?#]+\.html?)$",
    )
    .expect("atlas path pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasPage {
    pub origin: String,
    pub locale: String,
    pub version: Option<String>,
    pub deliverable: String,
    pub page: String,
}

impl AtlasPage {
    pub fn parse(url: &Url) -> Option<Self> {
        let caps = ATLAS_PATH.captures(url.path())?;
        Some(Self {
            origin: url.origin().ascii_serialization(),
            locale: caps["locale"].to_string(),
            version: caps.name("version").map(|m| m.as_str().to_string()),
            deliverable: caps["deliverable"].to_string(),
            page: caps["page"].to_string(),
        })
    }

    pub fn document_url(&self) -> String {
        format!(
            "{}/docs/get_document/atlas.{}.{}.meta",
            self.origin, self.locale, self.deliverable
        )
    }

    pub fn content_url(&self, version: &str) -> String {
        format!(
            "{}/docs/get_document_content/{}/{}/{}/{}",
            self.origin, self.deliverable, self.page, self.locale, version
        )
    }
}

#[derive(Debug, Deserialize)]
struct DocumentInfo {
    version: VersionInfo,
}

#[derive(Debug, Deserialize)]
struct VersionInfo {
    doc_version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentContent {
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
}

pub fn parse_document_version(body: &[u8]) -> Result<String> {
    let info: DocumentInfo = serde_json::from_slice(body)
        .map_err(|e| SfDocsError::Extraction(format!("unexpected get_document response: {e}")))?;
    Ok(info.version.doc_version)
}

pub fn parse_document_content(body: &[u8]) -> Result<DocumentContent> {
    serde_json::from_slice(body)
        .map_err(|e| SfDocsError::Extraction(format!("unexpected get_document_content response: {e}")))
}

/// Help articles under `/s/articleView` are rendered client-side; the
/// legacy viewer serves the same article as plain HTML.
pub fn rewrite_help_article(url: &Url) -> Option<Url> {
    if url.host_str() != Some("help.salesforce.com") || !url.path().starts_with("/s/articleView") {
        return None;
    }
    let id = url
        .query_pairs()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned())?;

    let mut rewritten = url.clone();
    rewritten.set_path("/apex/HTViewHelpDoc");
    rewritten
        .query_pairs_mut()
        .clear()
        .append_pair("id", &id)
        .append_pair("language", "en_US");
    Some(rewritten)
}
