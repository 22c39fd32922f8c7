mod common;

use common::{McpStreamableHttpSession, RecordingUpstream, call_text, spawn_http, write_spec};
use mcp_openapi_test_support::{pick_unused_port, wait_http_ok};
use serde_json::{Value, json};
use std::time::Duration;
use tempfile::tempdir;

#[tokio::test]
async fn streamable_http_roundtrip() -> anyhow::Result<()> {
    let upstream = RecordingUpstream::start().await?;
    let dir = tempdir()?;
    let spec = write_spec(dir.path())?;

    let port = pick_unused_port()?;
    let _server = spawn_http(&spec, upstream.base_url(), port)?;
    let base_url = format!("http://127.0.0.1:{port}");
    wait_http_ok(&format!("{base_url}/health"), Duration::from_secs(20)).await?;

    let session = McpStreamableHttpSession::connect(&base_url).await?;

    let listed = session.request(1, "tools/list", json!({})).await?;
    let tools = listed
        .pointer("/result/tools")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    assert_eq!(tools.len(), 2);
    let create = tools
        .iter()
        .find(|t| t["name"] == "createTodo")
        .expect("createTodo listed");
    assert_eq!(create["inputSchema"]["required"], json!(["title", "completed"]));
    assert_eq!(create["annotations"]["readOnlyHint"], json!(false));

    let called = session
        .request(
            2,
            "tools/call",
            json!({"name": "createTodo", "arguments": {"title": "Buy milk", "completed": "false"}}),
        )
        .await?;
    let echoed: Value = serde_json::from_str(call_text(&called)?)?;
    assert_eq!(echoed["method"], "POST");
    assert_eq!(echoed["path"], "/todos");
    assert_eq!(echoed["body"], json!({"title": "Buy milk", "completed": "false"}));

    Ok(())
}
