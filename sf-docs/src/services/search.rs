use std::sync::Arc;

use tracing::debug;

use crate::domain::{IndexedSource, SearchQuery, SearchResult};
use crate::error::{Result, SfDocsError};
use crate::ports::{EmbeddingGenerator, StoreStats, VectorStore};

pub struct SearchService<E, S>
where
    E: EmbeddingGenerator,
    S: VectorStore,
{
    embedder: Arc<E>,
    store: Arc<S>,
}

impl<E, S> SearchService<E, S>
where
    E: EmbeddingGenerator,
    S: VectorStore,
{
    pub const fn new(embedder: Arc<E>, store: Arc<S>) -> Self {
        Self { embedder, store }
    }

    /// Pin the store to this service's embedding model. Searching vectors
    /// from a different model would return noise.
    pub async fn prepare(&self) -> Result<()> {
        self.store
            .ensure_schema(self.embedder.model_name(), self.embedder.dimension())
            .await
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        if query.query.trim().is_empty() {
            return Err(SfDocsError::InvalidQuery("query is empty".to_string()));
        }

        let embedding = self.embedder.embed(&query.query).await?;
        let results = self.store.search(&embedding, query).await?;
        debug!(query = %query.query, results = results.len(), "Search complete");
        Ok(results)
    }

    pub async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
        self.store.list_sources().await
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        self.store.stats().await
    }
}
