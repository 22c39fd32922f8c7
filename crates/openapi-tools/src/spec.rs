//! Parsed `OpenAPI` document model.
//!
//! This is the shape the catalog builder consumes. Compared to `openapiv3::OpenAPI`,
//! references are already resolved, only path/query parameters survive, and schemas are a
//! closed set of variants (see [`SchemaKind`]).

use serde_json::Value;
use std::fmt;

/// Root of a parsed `OpenAPI` document.
#[derive(Debug, Clone, Default)]
pub struct Specification {
    pub info: Info,
    /// Declared servers, in document order. Only the first one is used.
    pub servers: Vec<Server>,
    /// Path templates with their operations, in document order.
    pub paths: Vec<PathItem>,
}

#[derive(Debug, Clone, Default)]
pub struct Info {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Server {
    pub url: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PathItem {
    /// Path template, e.g. `/todos/{todo_id}`.
    pub url: String,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone)]
pub struct Operation {
    pub operation_id: Option<String>,
    pub method: HttpMethod,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub parameters: Vec<Parameter>,
    pub request_body: Option<RequestBody>,
}

impl Operation {
    /// Tool description: summary and description joined with `" - "`, empty parts dropped.
    #[must_use]
    pub fn tool_description(&self) -> String {
        [self.summary.as_deref(), self.description.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" - ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Trace => "TRACE",
        }
    }

    #[must_use]
    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Options => reqwest::Method::OPTIONS,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Trace => reqwest::Method::TRACE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterLocation {
    Path,
    Query,
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub location: ParameterLocation,
    pub schema: Schema,
    pub required: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RequestBody {
    pub required: bool,
    /// Content-type entries in document order.
    pub content: Vec<MediaType>,
}

#[derive(Debug, Clone)]
pub struct MediaType {
    pub content_type: String,
    pub schema: Schema,
}

/// A resolved schema: a closed type variant plus descriptive metadata.
#[derive(Debug, Clone)]
pub struct Schema {
    pub kind: SchemaKind,
    pub meta: SchemaMeta,
}

#[derive(Debug, Clone)]
pub enum SchemaKind {
    Integer,
    String,
    Boolean,
    Number,
    Null,
    Array {
        items: Option<Box<Schema>>,
    },
    Object {
        properties: Vec<Property>,
        required: Vec<String>,
    },
    /// No usable `type` (composition keywords, free-form `any`, unknown keywords).
    Untyped { reason: String },
}

impl SchemaKind {
    /// Short human-readable label, used in error messages.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            SchemaKind::Integer => "integer".to_string(),
            SchemaKind::String => "string".to_string(),
            SchemaKind::Boolean => "boolean".to_string(),
            SchemaKind::Number => "number".to_string(),
            SchemaKind::Null => "null".to_string(),
            SchemaKind::Array { .. } => "array".to_string(),
            SchemaKind::Object { .. } => "object".to_string(),
            SchemaKind::Untyped { reason } => format!("untyped ({reason})"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Property {
    pub name: String,
    pub schema: Schema,
}

#[derive(Debug, Clone, Default)]
pub struct SchemaMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub enumeration: Vec<Value>,
    pub example: Option<Value>,
    pub deprecated: bool,
    pub read_only: bool,
    pub write_only: bool,
    pub nullable: bool,
}

impl Schema {
    #[must_use]
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            meta: SchemaMeta::default(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.meta.description = Some(description.into());
        self
    }
}
