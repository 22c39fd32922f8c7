//! HTTP method semantics.
//!
//! Derives MCP `ToolAnnotations` for spec-derived tools from RFC 9110 method semantics.

use crate::spec::HttpMethod;
use rmcp::model::ToolAnnotations;

/// Tool annotations for an operation's HTTP method.
///
/// `openWorldHint` is always `true`: every tool talks to the upstream API.
#[must_use]
pub fn annotations_for_method(method: HttpMethod) -> ToolAnnotations {
    let (read_only, destructive, idempotent) = match method {
        HttpMethod::Get | HttpMethod::Head | HttpMethod::Options | HttpMethod::Trace => {
            (Some(true), Some(false), Some(true))
        }
        HttpMethod::Post => (Some(false), Some(false), Some(false)),
        HttpMethod::Put | HttpMethod::Delete => (Some(false), Some(true), Some(true)),
        // PATCH may or may not be idempotent; do not guess.
        HttpMethod::Patch => (Some(false), Some(true), None),
    };

    ToolAnnotations {
        title: None,
        read_only_hint: read_only,
        destructive_hint: destructive,
        idempotent_hint: idempotent,
        open_world_hint: Some(true),
    }
}
