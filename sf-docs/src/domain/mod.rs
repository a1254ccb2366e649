pub mod chunk;
pub mod document;
pub mod id;
pub mod search;
pub mod source;

pub use chunk::{Chunk, TextSpan};
pub use document::{Document, ExtractionStrategy, IndexedSource, content_hash};
pub use id::{ChunkId, DocId, SourceId};
pub use search::{MAX_LIMIT, SearchQuery, SearchResult};
pub use source::{Source, SourceKind};
