//! Scrape Salesforce documentation, embed it locally, and serve
//! nearest-neighbor search over MCP.

pub mod adapters;
pub mod chunking;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod logging;
pub mod mcp;
pub mod ports;
pub mod services;

pub use error::{Result, SfDocsError};
