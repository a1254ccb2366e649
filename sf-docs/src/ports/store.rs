use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Chunk, Document, IndexedSource, SearchQuery, SearchResult};
use crate::error::Result;

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Prepare tables and pin the store to one embedding model.
    async fn ensure_schema(&self, model: &str, dimension: usize) -> Result<()>;

    /// Swap everything stored for `document.source` for the given chunks.
    async fn replace_source(
        &self,
        document: &Document,
        chunks: &[Chunk],
        embeddings: &[Vec<f32>],
    ) -> Result<()>;

    async fn search(&self, embedding: &[f32], query: &SearchQuery) -> Result<Vec<SearchResult>>;
    async fn remove_source(&self, source: &str) -> Result<bool>;
    async fn list_sources(&self) -> Result<Vec<IndexedSource>>;
    async fn content_hash(&self, source: &str) -> Result<Option<String>>;
    async fn stats(&self) -> Result<StoreStats>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreStats {
    pub sources: usize,
    pub chunks: usize,
    pub model: Option<String>,
    pub dimension: Option<usize>,
}
