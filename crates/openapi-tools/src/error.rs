//! Error types for `mcp-openapi-tools`.

use thiserror::Error;

/// Main error type for `OpenAPI` tooling.
#[derive(Error, Debug)]
pub enum OpenApiToolsError {
    /// `OpenAPI` errors (spec structure, unresolved references).
    #[error("OpenAPI error: {0}")]
    OpenApi(String),

    #[error("OpenAPI error: failed to fetch spec from '{url}': {message}")]
    OpenApiSpecFetch { url: String, message: String },

    #[error("OpenAPI error: failed to read spec file '{path}': {source}")]
    OpenApiSpecReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("OpenAPI error: failed to parse OpenAPI spec from '{location}': {source}")]
    OpenApiSpecParse {
        location: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// The spec declares no `servers` and no base URL override is configured.
    #[error("No servers found in OpenAPI spec (set baseUrl explicitly)")]
    NoServerDeclared,

    /// The base URL could not be resolved into an absolute http(s) URL.
    #[error("Invalid base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },

    /// An operation has no `operationId`; tool names must be stable identifiers.
    #[error("Operation {method} {path} has no operationId")]
    MissingOperationId { method: String, path: String },

    /// A schema has no type (or one that cannot be exposed as a tool argument).
    #[error("Unsupported schema type for '{name}': {kind}")]
    UnsupportedType { name: String, kind: String },

    /// A request body whose schema is not an object.
    #[error(
        "Unsupported request body for operation '{operation_id}': '{content_type}' schema is {kind}, only object bodies are supported"
    )]
    UnsupportedBodyShape {
        operation_id: String,
        content_type: String,
        kind: String,
    },

    /// Two arguments of the same operation share one flat name.
    #[error("Duplicate parameter name '{name}' in operation '{operation_id}'")]
    DuplicateParameterName { operation_id: String, name: String },

    /// `tools/call` for a name that is not in the catalog.
    #[error("Tool not found: {0}")]
    UnknownTool(String),

    /// One or more required arguments were not supplied.
    #[error("Missing required parameters: {}", .0.join(", "))]
    MissingRequiredArguments(Vec<String>),

    /// A path argument that would change the request path once the URL is normalized.
    #[error("Invalid value for path parameter '{name}': '{value}'")]
    InvalidPathArgument { name: String, value: String },

    /// Upstream answered with a non-2xx status (only under the strict status policy).
    #[error("API returned {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    /// Outbound request failed at the transport level.
    #[error("Request error: {0}")]
    Request(String),

    /// JSON errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OpenApiToolsError {
    /// Whether this error belongs to a single operation (and may be skipped under a lenient
    /// build policy) rather than to the whole document.
    #[must_use]
    pub fn is_operation_scoped(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedType { .. }
                | Self::UnsupportedBodyShape { .. }
                | Self::DuplicateParameterName { .. }
        )
    }
}

/// Result type alias for `OpenAPI` tooling operations.
pub type Result<T> = std::result::Result<T, OpenApiToolsError>;
