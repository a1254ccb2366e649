use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Result, bail};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use super::{AppContext, print_json};
use sf_docs::SfDocsError;
use sf_docs::chunking::TextSplitter;
use sf_docs::services::{IngestionService, SourceOutcome, load_source_list, resolve_sources};

pub async fn run(
    ctx: &AppContext,
    mut inputs: Vec<String>,
    file: Option<PathBuf>,
    force: bool,
) -> Result<()> {
    if let Some(path) = file {
        inputs.extend(load_source_list(&path)?);
    }
    if inputs.is_empty() {
        return Err(SfDocsError::InvalidSource(
            "no sources given; pass URLs or paths, or --file".to_string(),
        )
        .into());
    }
    let sources = resolve_sources(&inputs)?;

    let interactive = !ctx.json && std::io::stderr().is_terminal();
    let service = IngestionService::new(
        ctx.extractor()?,
        TextSplitter::from_config(&ctx.config.chunking)?,
        ctx.embedder(interactive)?,
        ctx.store().await?,
    );

    let bar = if interactive {
        let bar = ProgressBar::new(sources.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar
    } else {
        ProgressBar::hidden()
    };

    let result = service
        .ingest_all(&sources, force, |source, outcome| {
            let line = match outcome {
                Ok(SourceOutcome::Indexed { chunks }) => {
                    format!("{} {} ({chunks} chunks)", style("indexed").green(), source.locator)
                }
                Ok(SourceOutcome::Unchanged) => {
                    format!("{} {}", style("unchanged").dim(), source.locator)
                }
                Err(e) => format!("{} {}: {e}", style("failed").red(), source.locator),
            };
            bar.println(line);
            bar.inc(1);
        })
        .await?;
    bar.finish_and_clear();

    if ctx.json {
        print_json(&result)?;
    } else {
        println!(
            "{} indexed, {} unchanged, {} failed ({} chunks written)",
            result.sources_indexed,
            result.sources_unchanged,
            result.errors.len(),
            result.chunks_written
        );
        for failure in &result.errors {
            println!("  {} {}: {}", style("✗").red(), failure.source, failure.error);
        }
    }

    if result.sources_indexed + result.sources_unchanged == 0 {
        bail!("every source failed to ingest");
    }
    Ok(())
}
