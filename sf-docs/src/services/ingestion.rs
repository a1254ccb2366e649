use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::chunking::TextSplitter;
use crate::domain::{Chunk, Document, Source, content_hash};
use crate::error::{Result, SfDocsError};
use crate::extract::Extractor;
use crate::ports::{EmbeddingGenerator, PageFetcher, VectorStore};

/// What happened to a single source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome {
    Indexed { chunks: usize },
    Unchanged,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceFailure {
    pub source: String,
    pub error: String,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct IngestionResult {
    pub sources_indexed: usize,
    pub sources_unchanged: usize,
    pub chunks_written: usize,
    pub errors: Vec<SourceFailure>,
}

impl IngestionResult {
    pub const fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

pub struct IngestionService<F, E, S>
where
    F: PageFetcher,
    E: EmbeddingGenerator,
    S: VectorStore,
{
    extractor: Extractor<F>,
    splitter: TextSplitter,
    embedder: Arc<E>,
    store: Arc<S>,
}

impl<F, E, S> IngestionService<F, E, S>
where
    F: PageFetcher,
    E: EmbeddingGenerator,
    S: VectorStore,
{
    pub const fn new(
        extractor: Extractor<F>,
        splitter: TextSplitter,
        embedder: Arc<E>,
        store: Arc<S>,
    ) -> Self {
        Self {
            extractor,
            splitter,
            embedder,
            store,
        }
    }

    /// Ingest every source in order. A failing source is recorded and the
    /// run moves on; only store setup errors abort the whole run.
    pub async fn ingest_all(
        &self,
        sources: &[Source],
        force: bool,
        mut on_progress: impl FnMut(&Source, &Result<SourceOutcome>),
    ) -> Result<IngestionResult> {
        self.store
            .ensure_schema(self.embedder.model_name(), self.embedder.dimension())
            .await?;

        let mut result = IngestionResult::default();
        for source in sources {
            let outcome = self.ingest_source(source, force).await;
            match &outcome {
                Ok(SourceOutcome::Indexed { chunks }) => {
                    result.sources_indexed += 1;
                    result.chunks_written += chunks;
                }
                Ok(SourceOutcome::Unchanged) => result.sources_unchanged += 1,
                Err(e) => {
                    warn!(source = %source.locator, error = %e, "Failed to ingest source");
                    result.errors.push(SourceFailure {
                        source: source.locator.clone(),
                        error: e.to_string(),
                    });
                }
            }
            on_progress(source, &outcome);
        }

        info!(
            indexed = result.sources_indexed,
            unchanged = result.sources_unchanged,
            failed = result.errors.len(),
            chunks = result.chunks_written,
            "Ingestion finished"
        );
        Ok(result)
    }

    /// Extract, chunk, embed, and store one source. Content whose hash
    /// matches what is already stored is skipped unless `force` is set.
    pub async fn ingest_source(&self, source: &Source, force: bool) -> Result<SourceOutcome> {
        let page = self.extractor.extract(source).await?;

        if !force {
            let stored = self.store.content_hash(&source.locator).await?;
            if stored.as_deref() == Some(content_hash(&page.text).as_str()) {
                info!(source = %source.locator, "Content unchanged, skipping");
                return Ok(SourceOutcome::Unchanged);
            }
        }

        let mut document = Document::new(source.clone(), page.title, page.text, page.strategy);
        if let Some(final_url) = page.final_url {
            document = document.with_final_url(final_url);
        }

        let chunks: Vec<Chunk> = self
            .splitter
            .split(&document.text)
            .into_iter()
            .enumerate()
            .map(|(index, span)| Chunk::new(&document.id, source.locator.clone(), index, span))
            .collect();
        if chunks.is_empty() {
            return Err(SfDocsError::NoContent(source.locator.clone()));
        }

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        self.store
            .replace_source(&document, &chunks, &embeddings)
            .await?;

        info!(
            source = %source.locator,
            strategy = %document.strategy,
            chunks = chunks.len(),
            "Indexed source"
        );
        Ok(SourceOutcome::Indexed {
            chunks: chunks.len(),
        })
    }
}
