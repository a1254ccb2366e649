pub mod ingestion;
pub mod search;
pub mod source;

pub use ingestion::{IngestionResult, IngestionService, SourceFailure, SourceOutcome};
pub use search::SearchService;
pub use source::{load_source_list, parse_source_list, resolve_sources};
