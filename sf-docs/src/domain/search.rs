use serde::{Deserialize, Serialize};

use super::ChunkId;

pub const MAX_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    pub limit: usize,
    pub source: Option<String>,
    pub min_score: Option<f32>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: 5,
            source: None,
            min_score: None,
        }
    }

    /// Limits outside `1..=MAX_LIMIT` are clamped into range.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.clamp(1, MAX_LIMIT);
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub const fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = Some(min_score);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub chunk_id: ChunkId,
    pub source: String,
    pub title: String,
    pub index: usize,
    pub text: String,
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(SearchQuery::new("apex").with_limit(0).limit, 1);
        assert_eq!(SearchQuery::new("apex").with_limit(500).limit, MAX_LIMIT);
        assert_eq!(SearchQuery::new("apex").with_limit(7).limit, 7);
    }
}
