use serde::{Deserialize, Serialize};

use super::{ChunkId, DocId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub id: ChunkId,
    pub doc_id: DocId,
    pub source: String,
    pub index: usize,
    pub text: String,
    pub start_byte: usize,
    pub end_byte: usize,
}

impl Chunk {
    pub fn new(doc_id: &DocId, source: impl Into<String>, index: usize, span: TextSpan) -> Self {
        Self {
            id: ChunkId::for_chunk(doc_id, index),
            doc_id: doc_id.clone(),
            source: source.into(),
            index,
            text: span.text,
            start_byte: span.start,
            end_byte: span.end,
        }
    }
}

/// A slice of a larger text together with its byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    pub text: String,
    pub start: usize,
    pub end: usize,
}
