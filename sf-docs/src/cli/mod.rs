use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};

use sf_docs::adapters::{FastEmbedder, HttpFetcher, SurrealStore};
use sf_docs::config::Config;
use sf_docs::extract::Extractor;
use sf_docs::services::SearchService;

mod extract;
mod ingest;
mod mcp;
mod search;
mod sources;
mod status;

#[derive(Parser)]
#[command(name = "sf-docs")]
#[command(about = "Index Salesforce documentation for semantic search and serve it over MCP")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output as JSON")]
    pub json: bool,

    #[arg(long, global = true, help = "Config file to use instead of .sf-docs.toml")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Fetch, chunk, embed, and store documentation sources")]
    Ingest {
        #[arg(help = "URLs or local files (PDF, Markdown, HTML, text)")]
        sources: Vec<String>,

        #[arg(long, help = "Read sources from a file, one per line")]
        file: Option<PathBuf>,

        #[arg(long, help = "Re-index even when content is unchanged")]
        force: bool,
    },

    #[command(about = "Search indexed documentation")]
    Search {
        #[arg(help = "Search query")]
        query: String,

        #[arg(short, long, help = "Maximum results to return")]
        limit: Option<usize>,

        #[arg(long, help = "Only search chunks from this source")]
        source: Option<String>,

        #[arg(long, help = "Drop results scoring below this cosine similarity")]
        min_score: Option<f32>,
    },

    #[command(about = "Print the text extracted from a source without indexing it")]
    Extract {
        #[arg(help = "URL or local file")]
        source: String,
    },

    #[command(about = "List indexed sources")]
    Sources,

    #[command(about = "Remove a source and its chunks from the index")]
    Remove {
        #[arg(help = "Source URL or path, as listed by `sources`")]
        source: String,
    },

    #[command(about = "Show index statistics and configuration")]
    Status,

    #[command(about = "Start the MCP server on stdio")]
    Mcp,
}

pub async fn run(cli: Cli) -> Result<()> {
    let ctx = AppContext::load(cli.config.as_deref(), cli.json)?;

    match cli.command {
        Commands::Ingest {
            sources,
            file,
            force,
        } => ingest::run(&ctx, sources, file, force).await,
        Commands::Search {
            query,
            limit,
            source,
            min_score,
        } => search::run(&ctx, query, limit, source, min_score).await,
        Commands::Extract { source } => extract::run(&ctx, &source).await,
        Commands::Sources => sources::list(&ctx).await,
        Commands::Remove { source } => sources::remove(&ctx, &source).await,
        Commands::Status => status::run(&ctx).await,
        Commands::Mcp => mcp::run(&ctx).await,
    }
}

/// Loaded configuration plus constructors for the adapters commands share.
pub struct AppContext {
    pub config: Config,
    pub json: bool,
}

impl AppContext {
    fn load(explicit: Option<&std::path::Path>, json: bool) -> Result<Self> {
        let config = Config::load(explicit)?;
        Ok(Self { config, json })
    }

    pub async fn store(&self) -> Result<Arc<SurrealStore>> {
        let store = SurrealStore::connect(&self.config.store)
            .await
            .with_context(|| format!("opening store at {}", self.config.store.endpoint))?;
        Ok(Arc::new(store))
    }

    pub fn embedder(&self, show_progress: bool) -> Result<Arc<FastEmbedder>> {
        let embedder = FastEmbedder::new(
            &self.config.embedding,
            self.config.model_cache_dir(),
            show_progress,
        )?;
        Ok(Arc::new(embedder))
    }

    pub fn extractor(&self) -> Result<Extractor<HttpFetcher>> {
        let fetcher = Arc::new(HttpFetcher::new(&self.config.fetch)?);
        Ok(Extractor::new(fetcher, &self.config.extract)?)
    }

    pub async fn search_service(
        &self,
        show_progress: bool,
    ) -> Result<SearchService<FastEmbedder, SurrealStore>> {
        let service = SearchService::new(self.embedder(show_progress)?, self.store().await?);
        service.prepare().await?;
        Ok(service)
    }
}

pub fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
