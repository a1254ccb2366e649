//! MCP server over stdio.
//!
//! Messages are newline-delimited JSON-RPC 2.0. Logs go to stderr so stdout
//! carries nothing but protocol frames.

pub mod protocol;
pub mod tools;

use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::domain::SearchQuery;
use crate::error::Result;
use crate::ports::{EmbeddingGenerator, VectorStore};
use crate::services::SearchService;
use protocol::{ErrorCode, MCP_PROTOCOL_VERSION, Request, Response, RpcError};
use tools::{CallParams, LIST_SOURCES_TOOL, SEARCH_TOOL, SearchArgs};

pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

pub struct McpServer<E, S>
where
    E: EmbeddingGenerator,
    S: VectorStore,
{
    search: SearchService<E, S>,
    defaults: SearchConfig,
}

impl<E, S> McpServer<E, S>
where
    E: EmbeddingGenerator,
    S: VectorStore,
{
    pub const fn new(search: SearchService<E, S>, defaults: SearchConfig) -> Self {
        Self { search, defaults }
    }

    /// Serve until the reader reaches EOF. A bad frame gets an error
    /// response and the loop keeps reading.
    pub async fn run<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("MCP server listening on stdio");
        let mut frame = Vec::new();

        loop {
            frame.clear();
            let read = (&mut reader)
                .take(MAX_MESSAGE_SIZE as u64 + 1)
                .read_until(b'\n', &mut frame)
                .await?;
            if read == 0 {
                break;
            }

            let response = if frame.last() != Some(&b'\n') && frame.len() > MAX_MESSAGE_SIZE {
                skip_line(&mut reader).await?;
                warn!("Dropped oversized MCP message");
                Some(Response::error(
                    Value::Null,
                    ErrorCode::InvalidRequest,
                    "Message too large",
                ))
            } else {
                match std::str::from_utf8(&frame) {
                    Ok(line) if line.trim().is_empty() => continue,
                    Ok(line) => self.handle_message(line).await,
                    Err(e) => {
                        warn!(error = %e, "MCP message is not UTF-8");
                        Some(Response::error(
                            Value::Null,
                            ErrorCode::ParseError,
                            format!("Invalid UTF-8: {e}"),
                        ))
                    }
                }
            };

            if let Some(response) = response {
                let json = serde_json::to_string(&response)?;
                writer.write_all(json.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        info!("stdin closed, MCP server exiting");
        Ok(())
    }

    /// Handle one frame. Notifications produce no response.
    pub async fn handle_message(&self, line: &str) -> Option<Response> {
        if line.len() > MAX_MESSAGE_SIZE {
            return Some(Response::error(
                Value::Null,
                ErrorCode::InvalidRequest,
                "Message too large",
            ));
        }

        let value = match serde_json::from_str::<Value>(line.trim()) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Malformed JSON-RPC message");
                return Some(Response::error(Value::Null, ErrorCode::ParseError, e.to_string()));
            }
        };
        if !value.is_object() {
            return Some(Response::error(
                Value::Null,
                ErrorCode::InvalidRequest,
                "Expected a JSON-RPC request object",
            ));
        }
        let reply_id = value.get("id").cloned().unwrap_or(Value::Null);
        let request = match serde_json::from_value::<Request>(value) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Invalid JSON-RPC request");
                return Some(Response::error(reply_id, ErrorCode::InvalidRequest, e.to_string()));
            }
        };

        let Some(id) = request.id.clone() else {
            debug!(method = %request.method, "Notification");
            return None;
        };

        if request.jsonrpc != protocol::JSONRPC_VERSION {
            return Some(Response::error(
                id,
                ErrorCode::InvalidRequest,
                format!("Unsupported jsonrpc version {:?}", request.jsonrpc),
            ));
        }

        debug!(method = %request.method, "Request");
        Some(match self.dispatch(&request).await {
            Ok(result) => Response::ok(id, result),
            Err(error) => Response::from_rpc_error(id, error),
        })
    }

    async fn dispatch(&self, request: &Request) -> std::result::Result<Value, RpcError> {
        match request.method.as_str() {
            "initialize" => Ok(json!({
                "protocolVersion": MCP_PROTOCOL_VERSION,
                "capabilities": { "tools": { "listChanged": false } },
                "serverInfo": {
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION")
                }
            })),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": tools::definitions() })),
            "tools/call" => self.call_tool(&request.params).await,
            other => Err(RpcError::new(
                ErrorCode::MethodNotFound,
                format!("Method not found: {other}"),
            )),
        }
    }

    async fn call_tool(&self, params: &Value) -> std::result::Result<Value, RpcError> {
        let call: CallParams = serde_json::from_value(params.clone())
            .map_err(|e| RpcError::new(ErrorCode::InvalidParams, e.to_string()))?;

        match call.name.as_str() {
            SEARCH_TOOL => {
                let args: SearchArgs = serde_json::from_value(call.arguments)
                    .map_err(|e| RpcError::new(ErrorCode::InvalidParams, e.to_string()))?;
                if args.query.trim().is_empty() {
                    return Err(RpcError::new(ErrorCode::InvalidParams, "query must not be empty"));
                }

                let mut query = SearchQuery::new(args.query)
                    .with_limit(args.limit.unwrap_or(self.defaults.default_limit));
                if let Some(source) = args.source {
                    query = query.with_source(source);
                }
                if let Some(min_score) = self.defaults.min_score {
                    query = query.with_min_score(min_score);
                }

                Ok(match self.search.search(&query).await {
                    Ok(results) => tools::tool_result(tools::format_results(&results), false),
                    Err(e) => {
                        warn!(error = %e, "Search tool failed");
                        tools::tool_result(format!("Search failed: {e}"), true)
                    }
                })
            }
            LIST_SOURCES_TOOL => Ok(match self.search.list_sources().await {
                Ok(sources) => tools::tool_result(tools::format_sources(&sources), false),
                Err(e) => tools::tool_result(format!("Listing sources failed: {e}"), true),
            }),
            other => Err(RpcError::new(
                ErrorCode::InvalidParams,
                format!("Unknown tool: {other}"),
            )),
        }
    }
}

/// Consume input up to and including the next newline.
async fn skip_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<()> {
    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            return Ok(());
        }
        let (len, done) = match buf.iter().position(|b| *b == b'\n') {
            Some(pos) => (pos + 1, true),
            None => (buf.len(), false),
        };
        reader.consume(len);
        if done {
            return Ok(());
        }
    }
}
