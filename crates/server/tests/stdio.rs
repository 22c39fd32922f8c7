mod common;

use common::{RecordingUpstream, StdioSession, call_text, write_spec};
use serde_json::{Value, json};
use tempfile::tempdir;

#[tokio::test]
async fn stdio_lists_and_calls_tools() -> anyhow::Result<()> {
    let upstream = RecordingUpstream::start().await?;
    let dir = tempdir()?;
    let spec = write_spec(dir.path())?;
    let mut session = StdioSession::start(&spec, upstream.base_url()).await?;

    let listed = session.request(1, "tools/list", json!({})).await?;
    let names: Vec<&str> = listed
        .pointer("/result/tools")
        .and_then(Value::as_array)
        .map(|tools| tools.iter().filter_map(|t| t["name"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(names, vec!["createTodo", "getTodosWithTag"]);

    let called = session
        .request(
            2,
            "tools/call",
            json!({"name": "getTodosWithTag", "arguments": {"tag": "shopping"}}),
        )
        .await?;
    let echoed: Value = serde_json::from_str(call_text(&called)?)?;
    assert_eq!(echoed["method"], "GET");
    assert_eq!(echoed["path"], "/todos/tags/shopping");
    assert_eq!(upstream.hits(), 1);

    Ok(())
}

#[tokio::test]
async fn stdio_reports_bad_calls_without_dying() -> anyhow::Result<()> {
    let upstream = RecordingUpstream::start().await?;
    let dir = tempdir()?;
    let spec = write_spec(dir.path())?;
    let mut session = StdioSession::start(&spec, upstream.base_url()).await?;

    let missing = session
        .request(
            1,
            "tools/call",
            json!({"name": "createTodo", "arguments": {"title": "Buy milk"}}),
        )
        .await?;
    assert_eq!(missing.pointer("/result/isError"), Some(&json!(true)));
    assert_eq!(
        call_text(&missing)?,
        "Missing required parameters: completed"
    );

    let unknown = session
        .request(2, "tools/call", json!({"name": "nope", "arguments": {}}))
        .await?;
    assert_eq!(unknown.pointer("/error/code"), Some(&json!(-32602)));

    // Still serving after both failures.
    let created = session
        .request(
            3,
            "tools/call",
            json!({"name": "createTodo", "arguments": {"title": "Buy milk", "completed": false}}),
        )
        .await?;
    assert!(created.pointer("/result/isError") != Some(&json!(true)));

    let seen = upstream.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(
        seen[0].body,
        Some(json!({"title": "Buy milk", "completed": "false"}))
    );
    Ok(())
}
