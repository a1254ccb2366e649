use thiserror::Error;

#[derive(Error, Debug)]
pub enum SfDocsError {
    #[error("Invalid source: {0}")]
    InvalidSource(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Source not indexed: {0}")]
    SourceNotFound(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Redirected to a login page while fetching {url}")]
    LoginRequired { url: String },

    #[error("Blocked by bot detection at {url}: {reason}")]
    BotDetected { url: String, reason: String },

    #[error("No extractable content at {0}")]
    NoContent(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Store was built with {stored}, but {requested} is configured")]
    ModelMismatch { stored: String, requested: String },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl SfDocsError {
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::SourceNotFound(_) => 1,
            Self::InvalidSource(_) | Self::InvalidQuery(_) | Self::Config(_) => 3,
            Self::HttpStatus { .. }
            | Self::LoginRequired { .. }
            | Self::BotDetected { .. }
            | Self::Http(_) => 4,
            Self::NoContent(_) | Self::Extraction(_) => 5,
            Self::Embedding(_) => 6,
            Self::Store(_) | Self::ModelMismatch { .. } | Self::DimensionMismatch { .. } => 7,
            Self::Protocol(_) => 8,
            Self::Io(_) | Self::Serialization(_) => 10,
        }
    }

    /// Whether a fetch that failed this way is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::BotDetected { .. } => true,
            Self::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.is_body()
                    || (e.is_request() && !e.is_redirect() && !e.is_builder())
            }
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SfDocsError>;
