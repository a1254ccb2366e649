mod common;

use std::sync::Arc;

use common::{KeywordEmbedder, memory_store};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use sf_docs::adapters::SurrealStore;
use sf_docs::config::SearchConfig;
use sf_docs::domain::{Chunk, Document, ExtractionStrategy, Source, TextSpan};
use sf_docs::mcp::McpServer;
use sf_docs::mcp::protocol::Response;
use sf_docs::ports::VectorStore;
use sf_docs::services::SearchService;

const SOURCE: &str = "https://docs.test/apex/governor_limits.htm";

async fn server() -> McpServer<KeywordEmbedder, SurrealStore> {
    let store = Arc::new(memory_store().await);
    let service = SearchService::new(Arc::new(KeywordEmbedder), Arc::clone(&store));
    service.prepare().await.unwrap();

    let source = Source::parse(SOURCE).unwrap();
    let texts = [
        "Governor limits cap the number of SOQL queries per transaction.",
        "Lightning web components use standard web platform features.",
    ];
    let document = Document::new(
        source,
        "Execution Governors and Limits",
        texts.join("\n\n"),
        ExtractionStrategy::StaticDom,
    );
    let chunks: Vec<Chunk> = texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            Chunk::new(
                &document.id,
                SOURCE,
                i,
                TextSpan {
                    text: (*text).to_string(),
                    start: 0,
                    end: text.len(),
                },
            )
        })
        .collect();
    let embeddings: Vec<Vec<f32>> = texts.iter().map(|t| KeywordEmbedder::vector(t)).collect();
    store.replace_source(&document, &chunks, &embeddings).await.unwrap();

    McpServer::new(service, SearchConfig::default())
}

async fn call(server: &McpServer<KeywordEmbedder, SurrealStore>, message: Value) -> Response {
    server
        .handle_message(&message.to_string())
        .await
        .expect("request should produce a response")
}

fn tool_text(response: &Response) -> &str {
    response.result.as_ref().unwrap()["content"][0]["text"]
        .as_str()
        .unwrap()
}

#[tokio::test]
async fn test_initialize_and_list_tools() {
    let server = server().await;

    let init = call(
        &server,
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {"protocolVersion": "2024-11-05"}}),
    )
    .await;
    let result = init.result.unwrap();
    assert_eq!(result["protocolVersion"], "2024-11-05");
    assert_eq!(result["serverInfo"]["name"], "sf-docs");
    assert!(result["capabilities"]["tools"].is_object());

    let tools = call(&server, json!({"jsonrpc": "2.0", "id": "t", "method": "tools/list"})).await;
    assert_eq!(tools.id, json!("t"));
    let names: Vec<String> = tools.result.unwrap()["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["search_salesforce_docs", "list_indexed_sources"]);
}

#[tokio::test]
async fn test_search_tool_returns_passages() {
    let server = server().await;

    let response = call(
        &server,
        json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "tools/call",
            "params": {"name": "search_salesforce_docs", "arguments": {"query": "SOQL governor limits", "limit": 1}}
        }),
    )
    .await;

    assert!(response.error.is_none());
    assert_eq!(response.result.as_ref().unwrap()["isError"], false);
    let text = tool_text(&response);
    assert!(text.contains("Governor limits cap the number of SOQL queries"));
    assert!(text.contains(SOURCE));
    assert!(!text.contains("Lightning web components"));
}

#[tokio::test]
async fn test_list_sources_tool() {
    let server = server().await;
    let response = call(
        &server,
        json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call", "params": {"name": "list_indexed_sources"}}),
    )
    .await;

    let text = tool_text(&response);
    assert!(text.contains("1 indexed source(s)"));
    assert!(text.contains("Execution Governors and Limits"));
}

#[tokio::test]
async fn test_protocol_errors() {
    let server = server().await;

    let parse = server.handle_message("{not json").await.unwrap();
    assert_eq!(parse.error.unwrap().code, -32700);
    assert_eq!(parse.id, Value::Null);

    let unknown = call(&server, json!({"jsonrpc": "2.0", "id": 4, "method": "resources/list"})).await;
    assert_eq!(unknown.error.unwrap().code, -32601);

    let bad_tool = call(
        &server,
        json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call", "params": {"name": "delete_everything"}}),
    )
    .await;
    assert_eq!(bad_tool.error.unwrap().code, -32602);

    let empty_query = call(
        &server,
        json!({"jsonrpc": "2.0", "id": 6, "method": "tools/call", "params": {"name": "search_salesforce_docs", "arguments": {"query": " "}}}),
    )
    .await;
    assert_eq!(empty_query.error.unwrap().code, -32602);

    let huge = "x".repeat(sf_docs::mcp::MAX_MESSAGE_SIZE + 1);
    let too_large = server.handle_message(&huge).await.unwrap();
    assert_eq!(too_large.error.unwrap().code, -32600);
}

#[tokio::test]
async fn test_notifications_get_no_response() {
    let server = server().await;
    let response = server
        .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
        .await;
    assert!(response.is_none());
}

#[tokio::test]
async fn test_run_loop_writes_one_line_per_request() {
    let server = server().await;
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
        "\n",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "\n\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
        "\n"
    );
    let mut output: Vec<u8> = Vec::new();

    server
        .run(tokio::io::BufReader::new(input.as_bytes()), &mut output)
        .await
        .unwrap();

    let lines: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], json!({"jsonrpc": "2.0", "id": 1, "result": {}}));
    assert_eq!(lines[1]["id"], 2);
}

async fn run_frames(server: &McpServer<KeywordEmbedder, SurrealStore>, input: &[u8]) -> Vec<Value> {
    let mut output: Vec<u8> = Vec::new();
    server
        .run(tokio::io::BufReader::new(input), &mut output)
        .await
        .unwrap();
    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[tokio::test]
async fn test_run_loop_survives_invalid_utf8() {
    let server = server().await;
    let mut input = Vec::new();
    input.extend_from_slice(br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#);
    input.extend_from_slice(b"\n\xff\xfe garbage\n");
    input.extend_from_slice(br#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#);
    input.push(b'\n');

    let lines = run_frames(&server, &input).await;

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["id"], 1);
    assert_eq!(lines[1]["error"]["code"], -32700);
    assert_eq!(lines[1]["id"], Value::Null);
    assert_eq!(lines[2], json!({"jsonrpc": "2.0", "id": 2, "result": {}}));
}

#[tokio::test]
async fn test_run_loop_skips_oversized_line() {
    let server = server().await;
    let mut input = "x".repeat(sf_docs::mcp::MAX_MESSAGE_SIZE + 4096).into_bytes();
    input.push(b'\n');
    input.extend_from_slice(br#"{"jsonrpc":"2.0","id":9,"method":"ping"}"#);
    input.push(b'\n');

    let lines = run_frames(&server, &input).await;

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["error"]["code"], -32600);
    assert_eq!(lines[1], json!({"jsonrpc": "2.0", "id": 9, "result": {}}));
}

#[tokio::test]
async fn test_json_that_is_not_a_request() {
    let server = server().await;

    for message in ["[]", r#"["2.0", 1, "ping"]"#, "42", r#"{"jsonrpc":"2.0"}"#] {
        let response = server.handle_message(message).await.unwrap();
        assert_eq!(response.error.unwrap().code, -32600, "message: {message}");
    }

    let missing_method = server
        .handle_message(r#"{"jsonrpc":"2.0","id":7}"#)
        .await
        .unwrap();
    assert_eq!(missing_method.id, json!(7));
    assert_eq!(missing_method.error.unwrap().code, -32600);
}

#[tokio::test]
async fn test_null_id_gets_a_response() {
    let server = server().await;
    let response = server
        .handle_message(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#)
        .await
        .expect("a null id is a request, not a notification");
    assert_eq!(response.id, Value::Null);
    assert_eq!(response.result, Some(json!({})));
}

#[tokio::test]
async fn test_search_limit_is_clamped() {
    let server = server().await;
    let search = |id: i64, limit: i64| {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": {"name": "search_salesforce_docs", "arguments": {"query": "governor limits", "limit": limit}}
        })
    };

    let smallest = call(&server, search(10, 0)).await;
    let text = tool_text(&smallest);
    assert!(text.contains("[1] "));
    assert!(!text.contains("[2] "));

    let largest = call(&server, search(11, 500)).await;
    assert!(largest.error.is_none());
    let text = tool_text(&largest);
    assert!(text.contains("[1] "));
    assert!(text.contains("[2] "));
}
