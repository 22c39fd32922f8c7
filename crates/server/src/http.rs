//! Streamable HTTP transport: MCP at `/mcp`, liveness at `/health`.

use crate::server::OpenApiServer;
use anyhow::Context as _;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use mcp_openapi_tools::OpenApiToolSource;
use rmcp::transport::streamable_http_server::StreamableHttpService;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use serde_json::{Value, json};
use std::net::SocketAddr;

pub fn router(source: OpenApiToolSource) -> Router {
    let factory_source = source.clone();
    let mcp = StreamableHttpService::new(
        move || Ok(OpenApiServer::new(factory_source.clone())),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    Router::new()
        .route("/health", get(health))
        .with_state(source)
        .nest_service("/mcp", mcp)
}

async fn health(State(source): State<OpenApiToolSource>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "api": source.spec_title(),
        "tools": source.descriptors().len(),
    }))
}

/// Serve until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(source: OpenApiToolSource, bind: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("bind {bind}"))?;
    tracing::info!(addr = %listener.local_addr()?, "serving MCP over streamable HTTP at /mcp");

    axum::serve(listener, router(source))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
        .context("http server")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcp_openapi_tools::{SourceOptions, loader};

    #[tokio::test]
    async fn health_reports_tool_count() {
        let spec = loader::parse_document(
            r#"
openapi: "3.0.0"
info: { title: Todo API, version: "1" }
servers: [{ url: "https://todo.example.com" }]
paths:
  /todos:
    get:
      operationId: getTodos
      responses: { "200": { description: ok } }
"#,
            "inline",
        )
        .unwrap();
        let source =
            OpenApiToolSource::from_spec(&spec, "inline", &SourceOptions::default()).unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let server = axum::serve(listener, router(source)).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        let handle = tokio::spawn(async move { server.await });

        let body: Value = reqwest::get(format!("http://{addr}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body, json!({"status": "ok", "api": "Todo API", "tools": 1}));

        let _ = shutdown_tx.send(());
        handle.await.unwrap().unwrap();
    }
}
