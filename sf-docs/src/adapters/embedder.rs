use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::info;

use crate::config::EmbeddingConfig;
use crate::error::{Result, SfDocsError};
use crate::ports::EmbeddingGenerator;

/// Supported model names and their output dimensions.
pub const SUPPORTED_MODELS: &[(&str, usize)] = &[
    ("all-minilm-l6-v2", 384),
    ("bge-small-en-v1.5", 384),
    ("bge-base-en-v1.5", 768),
    ("nomic-embed-text-v1.5", 768),
];

pub fn resolve_model(name: &str) -> Result<(EmbeddingModel, usize)> {
    let model = match name.to_ascii_lowercase().as_str() {
        "all-minilm-l6-v2" => EmbeddingModel::AllMiniLML6V2,
        "bge-small-en-v1.5" => EmbeddingModel::BGESmallENV15,
        "bge-base-en-v1.5" => EmbeddingModel::BGEBaseENV15,
        "nomic-embed-text-v1.5" => EmbeddingModel::NomicEmbedTextV15,
        _ => {
            let known: Vec<&str> = SUPPORTED_MODELS.iter().map(|(n, _)| *n).collect();
            return Err(SfDocsError::Config(format!(
                "unknown embedding model {name:?} (expected one of: {})",
                known.join(", ")
            )));
        }
    };
    let dimension = SUPPORTED_MODELS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map_or(0, |(_, d)| *d);
    Ok((model, dimension))
}

/// Local ONNX embeddings. The first use downloads the model into the cache
/// directory.
pub struct FastEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
    name: String,
    dimension: usize,
    batch_size: usize,
}

impl FastEmbedder {
    pub fn new(config: &EmbeddingConfig, cache_dir: PathBuf, show_progress: bool) -> Result<Self> {
        let (model, dimension) = resolve_model(&config.model)?;
        info!(model = %config.model, cache = %cache_dir.display(), "Loading embedding model");

        let options = InitOptions::new(model)
            .with_cache_dir(cache_dir)
            .with_show_download_progress(show_progress);
        let embedding = TextEmbedding::try_new(options)
            .map_err(|e| SfDocsError::Embedding(format!("failed to load {}: {e}", config.model)))?;

        Ok(Self {
            model: Arc::new(Mutex::new(embedding)),
            name: config.model.to_ascii_lowercase(),
            dimension,
            batch_size: config.batch_size.max(1),
        })
    }
}

#[async_trait]
impl EmbeddingGenerator for FastEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| SfDocsError::Embedding("model returned no embedding".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();
        let batch_size = self.batch_size;

        tokio::task::spawn_blocking(move || {
            let guard = model
                .lock()
                .map_err(|_| SfDocsError::Embedding("embedding model lock poisoned".to_string()))?;
            guard
                .embed(texts, Some(batch_size))
                .map_err(|e| SfDocsError::Embedding(e.to_string()))
        })
        .await
        .map_err(|e| SfDocsError::Embedding(format!("embedding task failed: {e}")))?
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_model() {
        let (_, dim) = resolve_model("all-minilm-l6-v2").unwrap();
        assert_eq!(dim, 384);
        let (_, dim) = resolve_model("BGE-Base-EN-v1.5").unwrap();
        assert_eq!(dim, 768);
    }

    #[test]
    fn test_unknown_model() {
        let err = resolve_model("text-embedding-3-large").unwrap_err();
        assert!(matches!(err, SfDocsError::Config(ref m) if m.contains("all-minilm-l6-v2")));
    }
}
