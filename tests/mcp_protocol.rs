//! The stdio transport and dispatcher, driven over an in-memory pipe.

mod common;

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use common::{account, key, state_with, MockHive};
use hive_mcp_server::mcp::{
    handler::handle_mcp_request,
    protocol::{error_codes, Request, PROTOCOL_VERSION},
    stdio::serve,
};
use hive_mcp_server::AppState;

/// Feeds `input` to the server and collects every line it writes.
async fn exchange(state: AppState, input: &str) -> Vec<Value> {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server);
    let (client_read, mut client_write) = tokio::io::split(client);

    let server = tokio::spawn(serve(BufReader::new(server_read), server_write, state));

    client_write.write_all(input.as_bytes()).await.unwrap();
    client_write.shutdown().await.unwrap();

    let mut lines = BufReader::new(client_read).lines();
    let mut out = Vec::new();
    while let Some(line) = lines.next_line().await.unwrap() {
        out.push(serde_json::from_str(&line).unwrap());
    }
    server.await.unwrap().unwrap();
    out
}

fn by_id(responses: &[Value], id: i64) -> &Value {
    responses
        .iter()
        .find(|r| r["id"] == id)
        .unwrap_or_else(|| panic!("no response for id {id}"))
}

#[tokio::test]
async fn answers_each_request_once_and_skips_notifications() {
    let state = state_with(Arc::new(MockHive::default()), vec![]);
    let input = [
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
        "",
        r#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#,
    ]
    .join("\n")
        + "\n";

    let responses = exchange(state, &input).await;

    assert_eq!(responses.len(), 3);
    let init = by_id(&responses, 1);
    assert_eq!(init["result"]["protocolVersion"], PROTOCOL_VERSION);
    assert_eq!(init["result"]["serverInfo"]["name"], "hive-mcp-server");
    assert!(init["result"]["capabilities"]["prompts"].is_object());
    let tools = by_id(&responses, 2)["result"]["tools"].as_array().unwrap().len();
    assert_eq!(tools, 17);
    assert_eq!(by_id(&responses, 3)["result"], json!({}));
}

#[tokio::test]
async fn null_id_is_answered_but_absent_id_is_not() {
    let state = state_with(Arc::new(MockHive::default()), vec![]);
    let input = [
        r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#,
        r#"{"jsonrpc":"2.0","method":"ping"}"#,
    ]
    .join("\n")
        + "\n";

    let responses = exchange(state.clone(), &input).await;

    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["id"], Value::Null);
    assert_eq!(responses[0]["result"], json!({}));

    let silent = handle_mcp_request(Request::notification("ping", None), state).await;
    assert!(silent.is_none());
}

#[tokio::test]
async fn malformed_line_yields_parse_error() {
    let state = state_with(Arc::new(MockHive::default()), vec![]);

    let responses = exchange(state, "{not json}\n").await;

    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["error"]["code"], error_codes::PARSE_ERROR);
    assert_eq!(responses[0]["id"], Value::Null);
}

#[tokio::test]
async fn tool_call_returns_envelope() {
    let hive = Arc::new(MockHive {
        accounts: vec![account("alice", &key("alice-memo"))],
        ..MockHive::default()
    });
    let state = state_with(hive, vec![]);
    let input = json!({
        "jsonrpc": "2.0", "id": 7, "method": "tools/call",
        "params": {"name": "get_account_info", "arguments": {"username": "alice"}}
    })
    .to_string()
        + "\n";

    let responses = exchange(state, &input).await;

    let result = &by_id(&responses, 7)["result"];
    assert!(result.get("isError").is_none());
    assert_eq!(result["content"][0]["type"], "text");
    assert_eq!(result["content"][0]["mimeType"], "application/json");
    let account: Value = serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(account["name"], "alice");
}

async fn dispatch(state: &AppState, method: &str, params: Value) -> Value {
    let req = Request::new(json!(1), method, Some(params));
    let resp = handle_mcp_request(req, state.clone()).await.unwrap();
    serde_json::to_value(resp).unwrap()
}

#[tokio::test]
async fn invalid_arguments_are_protocol_errors() {
    let state = state_with(Arc::new(MockHive::default()), vec![]);

    let resp = dispatch(
        &state,
        "tools/call",
        json!({"name": "get_posts_by_tag", "arguments": {"category": "trending", "tag": "x", "limit": 50}}),
    )
    .await;
    assert_eq!(resp["error"]["code"], error_codes::INVALID_PARAMS);
    assert_eq!(resp["error"]["data"]["tool"], "get_posts_by_tag");
    assert_eq!(resp["error"]["data"]["issues"][0]["field"], "limit");

    let resp = dispatch(
        &state,
        "tools/call",
        json!({"name": "create_post", "arguments": {"title": "t", "body": "b", "tags": "[[1]]"}}),
    )
    .await;
    assert_eq!(resp["error"]["code"], error_codes::INVALID_PARAMS);
    assert_eq!(resp["error"]["data"]["issues"][0]["field"], "tags");

    let resp = dispatch(&state, "tools/call", json!({"name": "no_such_tool"})).await;
    assert_eq!(resp["error"]["code"], error_codes::INVALID_PARAMS);
}

#[tokio::test]
async fn unknown_method_is_not_found() {
    let state = state_with(Arc::new(MockHive::default()), vec![]);
    let resp = dispatch(&state, "sampling/createMessage", json!({})).await;
    assert_eq!(resp["error"]["code"], error_codes::METHOD_NOT_FOUND);
}

#[tokio::test]
async fn resources_read_accounts_and_posts() {
    let mut hive = MockHive {
        accounts: vec![account("alice", &key("alice-memo"))],
        ..MockHive::default()
    };
    hive.content.insert(
        ("alice".into(), "hello".into()),
        hive_mcp_server::blockchain::models::Content {
            author: "alice".into(),
            permlink: "hello".into(),
            title: "Hello".into(),
            body: "World".into(),
            ..Default::default()
        },
    );
    let state = state_with(Arc::new(hive), vec![]);

    let resp = dispatch(&state, "resources/read", json!({"uri": "hive://accounts/alice"})).await;
    let contents = &resp["result"]["contents"][0];
    assert_eq!(contents["uri"], "hive://accounts/alice");
    assert_eq!(contents["mimeType"], "application/json");
    assert!(contents["text"].as_str().unwrap().contains("\"name\": \"alice\""));

    let resp = dispatch(&state, "resources/read", json!({"uri": "hive://posts/alice/hello"})).await;
    assert_eq!(
        resp["result"]["contents"][0]["text"],
        "Title: Hello\nAuthor: alice\nBody: World"
    );

    let resp = dispatch(&state, "resources/read", json!({"uri": "hive://accounts/ghost"})).await;
    assert_eq!(resp["error"]["code"], error_codes::INVALID_PARAMS);

    let resp = dispatch(&state, "resources/templates/list", json!({})).await;
    assert_eq!(resp["result"]["resourceTemplates"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn resource_read_failure_is_internal_error() {
    let hive = MockHive {
        fail_reads: Some("down".into()),
        ..MockHive::default()
    };
    let state = state_with(Arc::new(hive), vec![]);
    let resp = dispatch(&state, "resources/read", json!({"uri": "hive://accounts/alice"})).await;
    assert_eq!(resp["error"]["code"], error_codes::INTERNAL_ERROR);
}

#[tokio::test]
async fn prompts_are_listed_and_rendered() {
    let state = state_with(Arc::new(MockHive::default()), vec![]);

    let resp = dispatch(&state, "prompts/list", json!({})).await;
    let names: Vec<&str> = resp["result"]["prompts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["create-post", "analyze-account"]);

    let resp = dispatch(
        &state,
        "prompts/get",
        json!({"name": "analyze-account", "arguments": {"username": "alice"}}),
    )
    .await;
    let text = resp["result"]["messages"][0]["content"]["text"].as_str().unwrap();
    assert!(text.contains("@alice"));

    let resp = dispatch(&state, "prompts/get", json!({"name": "nope"})).await;
    assert_eq!(resp["error"]["code"], error_codes::INVALID_PARAMS);
}
