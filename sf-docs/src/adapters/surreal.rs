//! Embedded SurrealDB vector store.
//!
//! Three tables: `document` (one row per source), `chunk` (text plus
//! embedding), and `meta` (the embedding model the store is pinned to).
//! Search is an exact cosine scan over `chunk`.

use std::path::Path;
use std::sync::OnceLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::Surreal;
use surrealdb::engine::any::{self, Any};
use tracing::debug;

use crate::config::StoreConfig;
use crate::domain::{
    Chunk, ChunkId, Document, ExtractionStrategy, IndexedSource, SearchQuery, SearchResult,
    SourceId, SourceKind,
};
use crate::error::{Result, SfDocsError};
use crate::ports::{StoreStats, VectorStore};

const SCHEMA: &str = "
DEFINE TABLE IF NOT EXISTS document SCHEMALESS;
DEFINE INDEX IF NOT EXISTS document_source ON TABLE document FIELDS source UNIQUE;
DEFINE TABLE IF NOT EXISTS chunk SCHEMALESS;
DEFINE INDEX IF NOT EXISTS chunk_source ON TABLE chunk FIELDS source;
DEFINE TABLE IF NOT EXISTS meta SCHEMALESS;
";

const REPLACE_SOURCE: &str = "
BEGIN TRANSACTION;
DELETE chunk WHERE source = $source;
DELETE document WHERE source = $source;
CREATE type::thing('document', $source_id) CONTENT $document;
FOR $row IN $chunks { CREATE chunk CONTENT $row; };
COMMIT TRANSACTION;
";

fn store_err(e: surrealdb::Error) -> SfDocsError {
    SfDocsError::Store(e.to_string())
}

#[derive(Debug, Serialize, Deserialize)]
struct MetaRow {
    model: String,
    dimension: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct DocumentRow {
    #[serde(default)]
    source_id: String,
    doc_id: String,
    source: String,
    kind: SourceKind,
    title: String,
    content_hash: String,
    chunk_count: usize,
    strategy: ExtractionStrategy,
    #[serde(default)]
    final_url: Option<String>,
    ingested_at: String,
}

#[derive(Debug, Serialize)]
struct ChunkRow {
    chunk_id: String,
    doc_id: String,
    source: String,
    title: String,
    chunk_index: usize,
    text: String,
    start_byte: usize,
    end_byte: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct SearchRow {
    chunk_id: String,
    source: String,
    title: String,
    chunk_index: usize,
    text: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
struct SourceRow {
    source: String,
}

#[derive(Debug, Deserialize)]
struct HashRow {
    content_hash: String,
}

#[derive(Debug, Deserialize)]
struct CountRow {
    count: usize,
}

pub struct SurrealStore {
    db: Surreal<Any>,
    dimension: OnceLock<usize>,
}

impl SurrealStore {
    /// Connect to `config.endpoint`. File-backed endpoints get their parent
    /// directory created first.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        if let Some(path) = config.endpoint.strip_prefix("surrealkv://")
            && let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        debug!(endpoint = %config.endpoint, "Connecting to store");
        let db = any::connect(config.endpoint.as_str())
            .await
            .map_err(store_err)?;
        db.use_ns(config.namespace.as_str())
            .use_db(config.database.as_str())
            .await
            .map_err(store_err)?;

        Ok(Self {
            db,
            dimension: OnceLock::new(),
        })
    }

    async fn stored_model(&self) -> Result<Option<MetaRow>> {
        let mut response = self
            .db
            .query("SELECT model, dimension FROM meta:embedding")
            .await
            .map_err(store_err)?;
        let rows: Vec<MetaRow> = response.take(0).map_err(store_err)?;
        Ok(rows.into_iter().next())
    }

    fn check_dimension(&self, actual: usize) -> Result<()> {
        match self.dimension.get() {
            Some(&expected) if expected != actual => {
                Err(SfDocsError::DimensionMismatch { expected, actual })
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl VectorStore for SurrealStore {
    async fn ensure_schema(&self, model: &str, dimension: usize) -> Result<()> {
        self.db
            .query(SCHEMA)
            .await
            .map_err(store_err)?
            .check()
            .map_err(store_err)?;

        match self.stored_model().await? {
            Some(stored) if stored.model != model || stored.dimension != dimension => {
                return Err(SfDocsError::ModelMismatch {
                    stored: format!("{} ({} dims)", stored.model, stored.dimension),
                    requested: format!("{model} ({dimension} dims)"),
                });
            }
            Some(_) => {}
            None => {
                self.db
                    .query("CREATE meta:embedding CONTENT $meta")
                    .bind((
                        "meta",
                        MetaRow {
                            model: model.to_string(),
                            dimension,
                        },
                    ))
                    .await
                    .map_err(store_err)?
                    .check()
                    .map_err(store_err)?;
                debug!(model, dimension, "Pinned store to embedding model");
            }
        }

        let _ = self.dimension.set(dimension);
        Ok(())
    }

    async fn replace_source(
        &self,
        document: &Document,
        chunks: &[Chunk],
        embeddings: &[Vec<f32>],
    ) -> Result<()> {
        if chunks.len() != embeddings.len() {
            return Err(SfDocsError::Store(format!(
                "{} chunks but {} embeddings for {}",
                chunks.len(),
                embeddings.len(),
                document.source.locator
            )));
        }
        for embedding in embeddings {
            self.check_dimension(embedding.len())?;
        }

        let source_id = document.source.id();
        let document_row = DocumentRow {
            source_id: source_id.to_string(),
            doc_id: document.id.to_string(),
            source: document.source.locator.clone(),
            kind: document.source.kind,
            title: document.title.clone(),
            content_hash: document.content_hash.clone(),
            chunk_count: chunks.len(),
            strategy: document.strategy,
            final_url: document.final_url.clone(),
            ingested_at: document.fetched_at.to_rfc3339(),
        };
        let chunk_rows: Vec<ChunkRow> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| ChunkRow {
                chunk_id: chunk.id.to_string(),
                doc_id: chunk.doc_id.to_string(),
                source: chunk.source.clone(),
                title: document.title.clone(),
                chunk_index: chunk.index,
                text: chunk.text.clone(),
                start_byte: chunk.start_byte,
                end_byte: chunk.end_byte,
                embedding: embedding.clone(),
            })
            .collect();

        self.db
            .query(REPLACE_SOURCE)
            .bind(("source", document.source.locator.clone()))
            .bind(("source_id", source_id.to_string()))
            .bind(("document", document_row))
            .bind(("chunks", chunk_rows))
            .await
            .map_err(store_err)?
            .check()
            .map_err(store_err)?;

        debug!(source = %document.source.locator, chunks = chunks.len(), "Replaced source");
        Ok(())
    }

    async fn search(&self, embedding: &[f32], query: &SearchQuery) -> Result<Vec<SearchResult>> {
        self.check_dimension(embedding.len())?;

        let mut sql = String::from(
            "SELECT chunk_id, source, title, chunk_index, text, \
             vector::similarity::cosine(embedding, $embedding) AS score FROM chunk",
        );
        if query.source.is_some() {
            sql.push_str(" WHERE source = $source");
        }
        sql.push_str(&format!(" ORDER BY score DESC LIMIT {}", query.limit.max(1)));

        let mut request = self.db.query(sql).bind(("embedding", embedding.to_vec()));
        if let Some(source) = &query.source {
            request = request.bind(("source", source.clone()));
        }
        let mut response = request.await.map_err(store_err)?;
        let rows: Vec<SearchRow> = response.take(0).map_err(store_err)?;

        #[allow(clippy::cast_possible_truncation)]
        let results = rows
            .into_iter()
            .map(|row| SearchResult {
                chunk_id: ChunkId::from_string(row.chunk_id),
                source: row.source,
                title: row.title,
                index: row.chunk_index,
                text: row.text,
                score: row.score as f32,
            })
            .filter(|result| query.min_score.is_none_or(|min| result.score >= min))
            .collect();
        Ok(results)
    }

    async fn remove_source(&self, source: &str) -> Result<bool> {
        let mut response = self
            .db
            .query("SELECT source FROM document WHERE source = $source")
            .query("DELETE chunk WHERE source = $source")
            .query("DELETE document WHERE source = $source")
            .bind(("source", source.to_string()))
            .await
            .map_err(store_err)?;
        let existing: Vec<SourceRow> = response.take(0).map_err(store_err)?;
        response.check().map_err(store_err)?;
        Ok(!existing.is_empty())
    }

    async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
        let mut response = self
            .db
            .query("SELECT * OMIT id FROM document ORDER BY source")
            .await
            .map_err(store_err)?;
        let rows: Vec<DocumentRow> = response.take(0).map_err(store_err)?;

        Ok(rows
            .into_iter()
            .map(|row| IndexedSource {
                id: if row.source_id.is_empty() {
                    SourceId::from_key(&row.source)
                } else {
                    SourceId::from_string(row.source_id)
                },
                ingested_at: DateTime::parse_from_rfc3339(&row.ingested_at)
                    .map_or_else(|_| Utc::now(), |t| t.with_timezone(&Utc)),
                source: row.source,
                kind: row.kind,
                title: row.title,
                content_hash: row.content_hash,
                chunk_count: row.chunk_count,
                strategy: row.strategy,
            })
            .collect())
    }

    async fn content_hash(&self, source: &str) -> Result<Option<String>> {
        let mut response = self
            .db
            .query("SELECT content_hash FROM document WHERE source = $source LIMIT 1")
            .bind(("source", source.to_string()))
            .await
            .map_err(store_err)?;
        let rows: Vec<HashRow> = response.take(0).map_err(store_err)?;
        Ok(rows.into_iter().next().map(|row| row.content_hash))
    }

    async fn stats(&self) -> Result<StoreStats> {
        let mut response = self
            .db
            .query("SELECT count() AS count FROM document GROUP ALL")
            .query("SELECT count() AS count FROM chunk GROUP ALL")
            .await
            .map_err(store_err)?;
        let documents: Vec<CountRow> = response.take(0).map_err(store_err)?;
        let chunks: Vec<CountRow> = response.take(1).map_err(store_err)?;
        let meta = self.stored_model().await?;

        Ok(StoreStats {
            sources: documents.first().map_or(0, |row| row.count),
            chunks: chunks.first().map_or(0, |row| row.count),
            model: meta.as_ref().map(|m| m.model.clone()),
            dimension: meta.map(|m| m.dimension),
        })
    }
}
