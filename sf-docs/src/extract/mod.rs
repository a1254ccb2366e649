//! Turning sources into plain text.
//!
//! Web pages go through a chain of strategies: the documentation JSON API
//! for atlas pages, the static DOM, readability, and finally any iframes
//! the page embeds. The first result long enough to be real content wins.

pub mod docs_api;
pub mod documents;
pub mod html;

use std::io::Cursor;
use std::sync::Arc;

use reqwest::Url;

use crate::config::ExtractConfig;
use crate::domain::{ExtractionStrategy, Source, SourceKind};
use crate::error::{Result, SfDocsError};
use crate::ports::PageFetcher;
use docs_api::AtlasPage;
use html::{HtmlExtractor, iframe_sources, normalize_text};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    pub title: String,
    pub text: String,
    pub strategy: ExtractionStrategy,
    pub final_url: Option<String>,
}

pub struct Extractor<F: PageFetcher> {
    fetcher: Arc<F>,
    html: HtmlExtractor,
    min_chars: usize,
    max_iframes: usize,
}

impl<F: PageFetcher> Extractor<F> {
    pub fn new(fetcher: Arc<F>, config: &ExtractConfig) -> Result<Self> {
        Ok(Self {
            fetcher,
            html: HtmlExtractor::new(&config.content_selectors, config.min_content_chars)?,
            min_chars: config.min_content_chars,
            max_iframes: config.max_iframes,
        })
    }

    pub async fn extract(&self, source: &Source) -> Result<ExtractedPage> {
        let page = match source.local_path() {
            None if source.kind == SourceKind::Pdf => {
                let page = self.fetcher.fetch(&source.locator).await?;
                let text = documents::pdf_text(page.body).await?;
                ExtractedPage {
                    title: source.fallback_title(),
                    text,
                    strategy: ExtractionStrategy::Pdf,
                    final_url: Some(page.final_url),
                }
            }
            None => self.extract_url(&source.locator).await?,
            Some(path) => {
                let bytes = tokio::fs::read(path).await?;
                self.extract_local(source, bytes).await?
            }
        };

        if page.text.is_empty() {
            return Err(SfDocsError::NoContent(source.locator.clone()));
        }
        Ok(page)
    }

    async fn extract_local(&self, source: &Source, bytes: Vec<u8>) -> Result<ExtractedPage> {
        let fallback = source.fallback_title();
        let page = match source.kind {
            SourceKind::Pdf => ExtractedPage {
                title: fallback,
                text: documents::pdf_text(bytes).await?,
                strategy: ExtractionStrategy::Pdf,
                final_url: None,
            },
            SourceKind::Markdown => {
                let (title, text) = documents::markdown_text(&String::from_utf8_lossy(&bytes));
                ExtractedPage {
                    title: title.unwrap_or(fallback),
                    text,
                    strategy: ExtractionStrategy::Markdown,
                    final_url: None,
                }
            }
            SourceKind::WebPage => {
                let content = self.html.extract(&String::from_utf8_lossy(&bytes));
                ExtractedPage {
                    title: content.title.unwrap_or(fallback),
                    text: content.text,
                    strategy: ExtractionStrategy::StaticDom,
                    final_url: None,
                }
            }
            SourceKind::Text => ExtractedPage {
                title: fallback,
                text: documents::plain_text(&String::from_utf8_lossy(&bytes)),
                strategy: ExtractionStrategy::PlainText,
                final_url: None,
            },
        };
        Ok(page)
    }

    async fn extract_url(&self, locator: &str) -> Result<ExtractedPage> {
        let url = Url::parse(locator).map_err(|e| SfDocsError::InvalidSource(format!("{locator}: {e}")))?;
        let url = docs_api::rewrite_help_article(&url).unwrap_or(url);
        let fallback = url
            .path_segments()
            .and_then(|mut s| s.next_back().map(str::to_string))
            .unwrap_or_else(|| url.to_string());

        let mut candidates: Vec<ExtractedPage> = Vec::new();

        if let Some(atlas) = AtlasPage::parse(&url) {
            match self.extract_atlas(&atlas).await {
                Ok(page) if self.is_enough(&page) => return Ok(page),
                Ok(page) => candidates.push(page),
                Err(e) => tracing::warn!(url = %url, "docs API extraction failed: {e}"),
            }
        }

        let page = match self.fetcher.fetch(url.as_str()).await {
            Ok(page) => page,
            Err(e) if candidates.iter().any(|c| !c.text.is_empty()) => {
                tracing::warn!(url = %url, "page fetch failed, keeping docs API text: {e}");
                return best_candidate(candidates, locator);
            }
            Err(e) => return Err(e),
        };
        if page.is_pdf() {
            return Ok(ExtractedPage {
                title: fallback,
                text: documents::pdf_text(page.body).await?,
                strategy: ExtractionStrategy::Pdf,
                final_url: Some(page.final_url),
            });
        }

        let base = Url::parse(&page.final_url).unwrap_or_else(|_| url.clone());
        let body = page.text();
        let (dom, readable, iframes) = self.extract_html(&body, &base);
        let title = dom
            .title
            .clone()
            .or_else(|| readable.as_ref().map(|(title, _)| title.clone()))
            .filter(|t| !t.is_empty())
            .unwrap_or(fallback);

        let dom_page = ExtractedPage {
            title: title.clone(),
            text: dom.text,
            strategy: ExtractionStrategy::StaticDom,
            final_url: Some(page.final_url.clone()),
        };
        if self.is_enough(&dom_page) {
            return Ok(dom_page);
        }
        candidates.push(dom_page);

        if let Some((_, text)) = readable {
            let readable_page = ExtractedPage {
                title: title.clone(),
                text,
                strategy: ExtractionStrategy::Readability,
                final_url: Some(page.final_url.clone()),
            };
            if self.is_enough(&readable_page) {
                return Ok(readable_page);
            }
            candidates.push(readable_page);
        }

        for frame_url in iframes {
            tracing::debug!(page = %url, frame = %frame_url, "following iframe");
            let frame = match self.fetcher.fetch(&frame_url).await {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!(frame = %frame_url, "iframe fetch failed: {e}");
                    continue;
                }
            };
            let content = self.html.extract(&frame.text());
            let frame_page = ExtractedPage {
                title: content.title.unwrap_or_else(|| title.clone()),
                text: content.text,
                strategy: ExtractionStrategy::Iframe,
                final_url: Some(frame.final_url),
            };
            if self.is_enough(&frame_page) {
                return Ok(frame_page);
            }
            candidates.push(frame_page);
        }

        best_candidate(candidates, locator)
    }

    async fn extract_atlas(&self, atlas: &AtlasPage) -> Result<ExtractedPage> {
        let version = match &atlas.version {
            Some(version) => version.clone(),
            None => {
                let info = self.fetcher.fetch(&atlas.document_url()).await?;
                docs_api::parse_document_version(&info.body)?
            }
        };

        let content_url = atlas.content_url(&version);
        let response = self.fetcher.fetch(&content_url).await?;
        let payload = docs_api::parse_document_content(&response.body)?;
        let content = self.html.extract(&payload.content);

        Ok(ExtractedPage {
            title: payload
                .title
                .or(content.title)
                .unwrap_or_else(|| atlas.page.clone()),
            text: content.text,
            strategy: ExtractionStrategy::DocsApi,
            final_url: Some(content_url),
        })
    }

    /// Parses synchronously so no DOM is held across an await point.
    fn extract_html(
        &self,
        body: &str,
        base: &Url,
    ) -> (html::HtmlContent, Option<(String, String)>, Vec<String>) {
        let dom = self.html.extract(body);
        let readable = readability_text(body, base);
        let iframes = iframe_sources(body, base, self.max_iframes);
        (dom, readable, iframes)
    }

    fn is_enough(&self, page: &ExtractedPage) -> bool {
        page.text.chars().count() >= self.min_chars
    }
}

/// The longest non-empty candidate.
fn best_candidate(candidates: Vec<ExtractedPage>, locator: &str) -> Result<ExtractedPage> {
    candidates
        .into_iter()
        .filter(|c| !c.text.is_empty())
        .max_by_key(|c| c.text.len())
        .ok_or_else(|| SfDocsError::NoContent(locator.to_string()))
}

fn readability_text(body: &str, base: &Url) -> Option<(String, String)> {
    let mut cursor = Cursor::new(body.as_bytes());
    match readability::extractor::extract(&mut cursor, base) {
        Ok(product) => {
            let text = normalize_text(&product.text);
            (!text.is_empty()).then(|| (product.title.trim().to_string(), text))
        }
        Err(e) => {
            tracing::debug!(url = %base, "readability failed: {e}");
            None
        }
    }
}
