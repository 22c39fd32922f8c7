//! MCP server handler over an [`OpenApiToolSource`].

use mcp_openapi_tools::{OpenApiToolSource, OpenApiToolsError};
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, ErrorData, Implementation,
    ListToolsResult, PaginatedRequestParams, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{RoleServer, ServerHandler};
use std::future::Future;

#[derive(Debug, Clone)]
pub struct OpenApiServer {
    source: OpenApiToolSource,
}

impl OpenApiServer {
    #[must_use]
    pub fn new(source: OpenApiToolSource) -> Self {
        Self { source }
    }
}

impl ServerHandler for OpenApiServer {
    fn get_info(&self) -> ServerInfo {
        let instructions = self.source.spec_description().map_or_else(
            || {
                format!(
                    "Tools for the {} API ({}), one per OpenAPI operation.",
                    self.source.spec_title(),
                    self.source.base_url()
                )
            },
            str::to_string,
        );

        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some(self.source.spec_title().to_string()),
                ..Default::default()
            },
            instructions: Some(instructions),
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, ErrorData>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult {
            tools: self.source.list_tools(),
            ..Default::default()
        }))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        async move {
            let result = self
                .source
                .call_tool(&request.name, request.arguments)
                .await;
            to_mcp_result(&request.name, result)
        }
    }
}

/// Unknown tools are protocol errors; everything else a tool call can hit is reported to the
/// client as an error result so the session stays usable.
pub fn to_mcp_result(
    tool: &str,
    result: mcp_openapi_tools::Result<CallToolResult>,
) -> Result<CallToolResult, ErrorData> {
    match result {
        Ok(r) => Ok(r),
        Err(e @ OpenApiToolsError::UnknownTool(_)) => {
            Err(ErrorData::invalid_params(e.to_string(), None))
        }
        Err(e) => {
            tracing::warn!(tool, error = %e, "tool call failed");
            Ok(CallToolResult::error(vec![Content::text(e.to_string())]))
        }
    }
}
