pub mod embedder;
pub mod http;
pub mod surreal;

pub use embedder::FastEmbedder;
pub use http::HttpFetcher;
pub use surreal::SurrealStore;
