use anyhow::Result;
use console::style;
use serde_json::json;

use super::{AppContext, print_json};
use sf_docs::SfDocsError;
use sf_docs::ports::VectorStore;

pub async fn list(ctx: &AppContext) -> Result<()> {
    let sources = ctx.store().await?.list_sources().await?;

    if ctx.json {
        return print_json(&sources);
    }
    if sources.is_empty() {
        println!("No sources indexed. Run `sf-docs ingest <url>` to add one.");
        return Ok(());
    }
    for source in &sources {
        println!(
            "{} {}",
            style(&source.title).bold(),
            style(format!(
                "[{}, {}, {} chunks, {}]",
                source.kind,
                source.strategy,
                source.chunk_count,
                source.ingested_at.format("%Y-%m-%d %H:%M")
            ))
            .dim()
        );
        println!("  {}", source.source);
    }
    Ok(())
}

pub async fn remove(ctx: &AppContext, source: &str) -> Result<()> {
    let removed = ctx.store().await?.remove_source(source).await?;
    if !removed {
        return Err(SfDocsError::SourceNotFound(source.to_string()).into());
    }

    if ctx.json {
        print_json(&json!({ "removed": source }))
    } else {
        println!("Removed {source}");
        Ok(())
    }
}
