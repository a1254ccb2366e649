pub mod embed;
pub mod fetch;
pub mod store;

pub use embed::EmbeddingGenerator;
pub use fetch::{FetchedPage, PageFetcher};
pub use store::{StoreStats, VectorStore};
