use anyhow::Result;
use console::style;
use serde_json::json;

use super::{AppContext, print_json};
use sf_docs::config::global_config_path;
use sf_docs::ports::VectorStore;

pub async fn run(ctx: &AppContext) -> Result<()> {
    let stats = ctx.store().await?.stats().await?;
    let config = &ctx.config;
    let mismatch = model_mismatch(stats.model.as_deref(), &config.embedding.model);

    if ctx.json {
        return print_json(&json!({
            "store": config.store.endpoint,
            "sources": stats.sources,
            "chunks": stats.chunks,
            "indexed_model": stats.model,
            "indexed_dimension": stats.dimension,
            "configured_model": config.embedding.model,
            "model_mismatch": mismatch,
            "chunk_size": config.chunking.chunk_size,
            "chunk_overlap": config.chunking.chunk_overlap,
            "config_files": config.loaded_from,
            "global_config": global_config_path(),
        }));
    }

    println!("{}", style("sf-docs status").bold());
    println!("  store:    {}", config.store.endpoint);
    println!("  sources:  {}", stats.sources);
    println!("  chunks:   {}", stats.chunks);
    match (&stats.model, stats.dimension) {
        (Some(model), Some(dimension)) => println!("  model:    {model} ({dimension} dims)"),
        _ => println!("  model:    {} (nothing indexed yet)", config.embedding.model),
    }
    if mismatch {
        println!(
            "  {} configured model {} differs from the indexed one; point SF_DOCS_DB at a fresh store to use it",
            style("warning:").yellow(),
            config.embedding.model
        );
    }
    println!(
        "  chunking: {} chars, {} overlap",
        config.chunking.chunk_size, config.chunking.chunk_overlap
    );
    if config.loaded_from.is_empty() {
        println!("  config:   none, using defaults");
    } else {
        for path in &config.loaded_from {
            println!("  config:   {}", path.display());
        }
    }
    Ok(())
}

/// Model names are matched case-insensitively, as the embedder resolves them.
fn model_mismatch(indexed: Option<&str>, configured: &str) -> bool {
    indexed.is_some_and(|model| !model.eq_ignore_ascii_case(configured))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_mismatch_ignores_case() {
        assert!(!model_mismatch(Some("bge-small-en-v1.5"), "BGE-Small-EN-v1.5"));
        assert!(!model_mismatch(None, "bge-small-en-v1.5"));
        assert!(model_mismatch(Some("all-minilm-l6-v2"), "bge-small-en-v1.5"));
    }
}
