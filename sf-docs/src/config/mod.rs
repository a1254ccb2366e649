use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SfDocsError};

const PROJECT_CONFIG: &str = ".sf-docs.toml";
pub const MAX_RETRIES: u32 = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub extract: ExtractConfig,
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingConfig,
    pub store: StoreConfig,
    pub search: SearchConfig,
    /// Files that contributed to this config, in load order.
    #[serde(skip)]
    pub loaded_from: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub accept_language: String,
    pub timeout_secs: u64,
    pub max_redirects: usize,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/124.0 Safari/537.36"
                .to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            timeout_secs: 30,
            max_redirects: 10,
            max_retries: 3,
            retry_backoff_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExtractConfig {
    pub min_content_chars: usize,
    pub max_iframes: usize,
    pub content_selectors: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            min_content_chars: 200,
            max_iframes: 3,
            content_selectors: [
                "article",
                "main",
                "[role=main]",
                ".slds-text-longform",
                "#content",
                ".content",
                "body",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub batch_size: usize,
    pub cache_dir: Option<PathBuf>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "all-minilm-l6-v2".to_string(),
            batch_size: 32,
            cache_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// SurrealDB endpoint, e.g. `surrealkv:///path/to/db` or `mem://`.
    pub endpoint: String,
    pub namespace: String,
    pub database: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: format!("surrealkv://{}", data_dir().join("db").display()),
            namespace: "sf_docs".to_string(),
            database: "docs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub default_limit: usize,
    pub min_score: Option<f32>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            min_score: None,
        }
    }
}

impl Config {
    /// Load the global config, then overlay the project config (or `explicit`
    /// in its place) key by key, then apply environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let project = explicit.map_or_else(|| PathBuf::from(PROJECT_CONFIG), Path::to_path_buf);
        Self::load_layers(&global_config_path(), &project, explicit.is_some(), |key| {
            std::env::var(key).ok()
        })
    }

    fn load_layers(
        global: &Path,
        project: &Path,
        project_required: bool,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let mut loaded_from = Vec::new();

        if let Some(layer) = read_layer(global)? {
            merge_values(&mut merged, layer);
            loaded_from.push(global.to_path_buf());
        }
        match read_layer(project)? {
            Some(layer) => {
                merge_values(&mut merged, layer);
                loaded_from.push(project.to_path_buf());
            }
            None if project_required => {
                return Err(SfDocsError::Config(format!(
                    "config file not found: {}",
                    project.display()
                )));
            }
            None => {}
        }

        let mut config: Self = merged
            .try_into()
            .map_err(|e: toml::de::Error| SfDocsError::Config(e.to_string()))?;
        config.loaded_from = loaded_from;

        let config = config.with_env_overrides(env);
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| SfDocsError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(mut self, env: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(endpoint) = env("SF_DOCS_DB") {
            self.store.endpoint = endpoint;
        }
        if let Some(model) = env("SF_DOCS_MODEL") {
            self.embedding.model = model;
        }
        if let Some(agent) = env("SF_DOCS_USER_AGENT") {
            self.fetch.user_agent = agent;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(SfDocsError::Config("chunking.chunk_size must be positive".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(SfDocsError::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.extract.content_selectors.is_empty() {
            return Err(SfDocsError::Config(
                "extract.content_selectors must not be empty".to_string(),
            ));
        }
        if self.fetch.max_retries > MAX_RETRIES {
            return Err(SfDocsError::Config(format!(
                "fetch.max_retries ({}) must be at most {MAX_RETRIES}",
                self.fetch.max_retries
            )));
        }
        if self.embedding.batch_size == 0 {
            return Err(SfDocsError::Config("embedding.batch_size must be positive".to_string()));
        }
        Ok(())
    }

    pub fn model_cache_dir(&self) -> PathBuf {
        self.embedding
            .cache_dir
            .clone()
            .unwrap_or_else(|| data_dir().join("models"))
    }
}

fn read_layer(path: &Path) -> Result<Option<toml::Value>> {
    if !path.exists() {
        return Ok(None);
    }
    tracing::debug!(path = %path.display(), "loading config");
    let content = std::fs::read_to_string(path)?;
    content
        .parse::<toml::Value>()
        .map(Some)
        .map_err(|e| SfDocsError::Config(format!("{}: {e}", path.display())))
}

/// Overlay `overlay` onto `base`. Tables merge recursively; any other value
/// replaces what was there.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "sf-docs")
}

pub fn global_config_path() -> PathBuf {
    project_dirs().map_or_else(
        || PathBuf::from("~/.config/sf-docs"),
        |d| d.config_dir().to_path_buf(),
    )
    .join("config.toml")
}

pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || PathBuf::from(".sf-docs"),
        |d| d.data_dir().to_path_buf(),
    )
}
