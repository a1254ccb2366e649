use std::fmt::Write as _;

use serde::Deserialize;
use serde_json::{Value, json};

use crate::domain::{IndexedSource, MAX_LIMIT, SearchResult};

pub const SEARCH_TOOL: &str = "search_salesforce_docs";
pub const LIST_SOURCES_TOOL: &str = "list_indexed_sources";

pub fn definitions() -> Value {
    json!([
        {
            "name": SEARCH_TOOL,
            "description": "Search indexed Salesforce documentation and return the most relevant passages with their source URLs.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Natural-language question or keywords"
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": MAX_LIMIT,
                        "description": "Maximum number of passages to return"
                    },
                    "source": {
                        "type": "string",
                        "description": "Only search chunks from this source URL or path"
                    }
                },
                "required": ["query"]
            }
        },
        {
            "name": LIST_SOURCES_TOOL,
            "description": "List the documentation sources that have been indexed.",
            "inputSchema": {
                "type": "object",
                "properties": {}
            }
        }
    ])
}

#[derive(Debug, Deserialize)]
pub struct CallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Deserialize)]
pub struct SearchArgs {
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub source: Option<String>,
}

/// Wrap text as an MCP `tools/call` result.
pub fn tool_result(text: impl Into<String>, is_error: bool) -> Value {
    json!({
        "content": [{ "type": "text", "text": text.into() }],
        "isError": is_error
    })
}

pub fn format_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No matching documentation found.".to_string();
    }

    let mut out = String::new();
    for (i, result) in results.iter().enumerate() {
        if i > 0 {
            out.push_str("\n---\n\n");
        }
        let _ = writeln!(out, "[{}] {} (score {:.3})", i + 1, result.title, result.score);
        let _ = writeln!(out, "Source: {} (chunk {})", result.source, result.index);
        let _ = writeln!(out, "\n{}", result.text);
    }
    out
}

pub fn format_sources(sources: &[IndexedSource]) -> String {
    if sources.is_empty() {
        return "No sources have been indexed yet.".to_string();
    }

    let mut out = format!("{} indexed source(s):\n", sources.len());
    for source in sources {
        let _ = writeln!(
            out,
            "- {} [{}, {} chunks, {}]\n  {}",
            source.title,
            source.kind,
            source.chunk_count,
            source.ingested_at.format("%Y-%m-%d %H:%M UTC"),
            source.source
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChunkId;

    #[test]
    fn test_definitions_name_both_tools() {
        let defs = definitions();
        let names: Vec<&str> = defs
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec![SEARCH_TOOL, LIST_SOURCES_TOOL]);
        assert_eq!(defs[0]["inputSchema"]["required"], json!(["query"]));
    }

    #[test]
    fn test_format_results() {
        let results = vec![SearchResult {
            chunk_id: ChunkId::from_string("chk-1"),
            source: "https://example.com/apex".to_string(),
            title: "Apex".to_string(),
            index: 2,
            text: "Triggers run before or after DML.".to_string(),
            score: 0.8765,
        }];

        let text = format_results(&results);
        assert!(text.starts_with("[1] Apex (score 0.877)"));
        assert!(text.contains("Source: https://example.com/apex (chunk 2)"));
        assert!(text.contains("Triggers run before or after DML."));
        assert_eq!(format_results(&[]), "No matching documentation found.");
    }
}
