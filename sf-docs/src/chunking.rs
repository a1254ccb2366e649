//! Recursive character splitting with overlap.
//!
//! Text is cut at the coarsest separator that yields pieces no longer than
//! the chunk size, then pieces are merged greedily. Each emitted chunk
//! hands its trailing pieces, up to the overlap budget, to the next one.
//! Sizes are measured in characters, offsets in bytes.

use std::collections::VecDeque;

use crate::config::ChunkingConfig;
use crate::domain::TextSpan;
use crate::error::{Result, SfDocsError};

const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " ", ""];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 || chunk_overlap >= chunk_size {
            return Err(SfDocsError::Config(format!(
                "chunk overlap ({chunk_overlap}) must be smaller than a positive chunk size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn split(&self, text: &str) -> Vec<TextSpan> {
        let mut spans = Vec::new();
        if !text.trim().is_empty() {
            self.split_range(text, (0, text.len()), 0, &mut spans);
        }
        spans
    }

    fn split_range(&self, text: &str, range: (usize, usize), level: usize, out: &mut Vec<TextSpan>) {
        let mut fitting: Vec<(usize, usize)> = Vec::new();

        for piece in pieces(text, range, SEPARATORS[level]) {
            if char_len(text, piece) <= self.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                self.merge(text, &fitting, out);
                fitting.clear();
            }
            // The last separator splits into single characters, which always fit.
            self.split_range(text, piece, level + 1, out);
        }

        if !fitting.is_empty() {
            self.merge(text, &fitting, out);
        }
    }

    fn merge(&self, text: &str, pieces: &[(usize, usize)], out: &mut Vec<TextSpan>) {
        let mut window: VecDeque<((usize, usize), usize)> = VecDeque::new();
        let mut total = 0;

        for &piece in pieces {
            let len = char_len(text, piece);
            if total + len > self.chunk_size && !window.is_empty() {
                emit(text, &window, out);
                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    let Some((_, dropped)) = window.pop_front() else {
                        break;
                    };
                    total -= dropped;
                }
            }
            window.push_back((piece, len));
            total += len;
        }

        if !window.is_empty() {
            emit(text, &window, out);
        }
    }
}

fn emit(text: &str, window: &VecDeque<((usize, usize), usize)>, out: &mut Vec<TextSpan>) {
    let (Some(((start, _), _)), Some(((_, end), _))) = (window.front(), window.back()) else {
        return;
    };
    let raw = &text[*start..*end];
    let trimmed_start = raw.trim_start();
    let start = start + (raw.len() - trimmed_start.len());
    let trimmed = trimmed_start.trim_end();
    if trimmed.is_empty() {
        return;
    }
    let span = TextSpan {
        text: trimmed.to_string(),
        start,
        end: start + trimmed.len(),
    };
    // Pieces from a finer level can reproduce the tail of the previous chunk.
    if out.last().is_some_and(|last| last.start == span.start && last.end == span.end) {
        return;
    }
    out.push(span);
}

/// Split `range` after each occurrence of `separator`, keeping the
/// separator attached so the pieces concatenate back to the input.
fn pieces(text: &str, (start, end): (usize, usize), separator: &str) -> Vec<(usize, usize)> {
    let slice = &text[start..end];

    if separator.is_empty() {
        return slice
            .char_indices()
            .map(|(i, c)| (start + i, start + i + c.len_utf8()))
            .collect();
    }

    let mut result = Vec::new();
    let mut cursor = start;
    for (i, _) in slice.match_indices(separator) {
        let piece_end = start + i + separator.len();
        if piece_end > cursor {
            result.push((cursor, piece_end));
            cursor = piece_end;
        }
    }
    if cursor < end {
        result.push((cursor, end));
    }
    result
}

fn char_len(text: &str, (start, end): (usize, usize)) -> usize {
    text[start..end].chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(spans: &[TextSpan]) -> Vec<&str> {
        spans.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        assert!(matches!(TextSplitter::new(10, 10), Err(SfDocsError::Config(_))));
        assert!(matches!(TextSplitter::new(0, 0), Err(SfDocsError::Config(_))));
    }

    #[test]
    fn test_empty_input() {
        let splitter = TextSplitter::new(100, 10).unwrap();
        assert!(splitter.split("").is_empty());
        assert!(splitter.split(" \n\n \t").is_empty());
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let splitter = TextSplitter::new(100, 10).unwrap();
        let spans = splitter.split("  Apex classes  ");
        assert_eq!(
            spans,
            vec![TextSpan {
                text: "Apex classes".to_string(),
                start: 2,
                end: 14,
            }]
        );
    }

    #[test]
    fn test_word_level_overlap() {
        let splitter = TextSplitter::new(10, 5).unwrap();
        let spans = splitter.split("aaaa bbbb cccc dddd");

        assert_eq!(texts(&spans), vec!["aaaa bbbb", "bbbb cccc", "cccc dddd"]);
        assert_eq!(
            spans.iter().map(|s| (s.start, s.end)).collect::<Vec<_>>(),
            vec![(0, 9), (5, 14), (10, 19)]
        );
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let splitter = TextSplitter::new(40, 0).unwrap();
        let text = "Flows automate processes.\n\nTriggers run Apex code.\n\nValidation rules check data.";
        let spans = splitter.split(text);

        assert_eq!(
            texts(&spans),
            vec![
                "Flows automate processes.",
                "Triggers run Apex code.",
                "Validation rules check data."
            ]
        );
    }

    #[test]
    fn test_chunks_respect_size_and_offsets() {
        let splitter = TextSplitter::new(120, 40).unwrap();
        let text = "Salesforce objects store records. ".repeat(30);
        let spans = splitter.split(&text);

        assert!(spans.len() > 3);
        for span in &spans {
            assert!(span.text.chars().count() <= 120, "chunk too long: {}", span.text);
            assert_eq!(&text[span.start..span.end], span.text);
        }
        for pair in spans.windows(2) {
            assert!(pair[1].start < pair[0].end, "consecutive chunks should overlap");
        }
    }

    #[test]
    fn test_no_overlap_across_paragraph_groups() {
        let splitter = TextSplitter::new(60, 20).unwrap();
        let text = format!("{}\n\nShort closing paragraph.", "word ".repeat(20));
        let spans = splitter.split(&text);

        let last = spans.last().unwrap();
        assert_eq!(last.text, "Short closing paragraph.");
        for span in &spans {
            assert_eq!(&text[span.start..span.end], span.text);
        }
    }

    #[test]
    fn test_multibyte_text_without_separators() {
        let splitter = TextSplitter::new(10, 3).unwrap();
        let text = "é".repeat(25);
        let spans = splitter.split(&text);

        assert!(spans.len() >= 3);
        for span in &spans {
            assert!(span.text.chars().count() <= 10);
            assert_eq!(&text[span.start..span.end], span.text);
        }
        assert_eq!(spans.first().unwrap().start, 0);
        assert_eq!(spans.last().unwrap().end, text.len());
    }
}
