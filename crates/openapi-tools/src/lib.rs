//! OpenAPI -> MCP tooling.
//!
//! Turns an `OpenAPI` 3 document into MCP tools (one per operation) and executes tool calls as
//! HTTP requests against the API the document describes:
//!
//! - [`loader`] / [`parser`]: read the document and resolve it into [`spec::Specification`]
//! - [`schema`] / [`classify`]: value kinds and the flat argument namespace of an operation
//! - [`catalog`]: tool descriptors and the route table
//! - [`binder`] / [`dispatch`]: arguments -> request -> response text
//! - [`runtime::OpenApiToolSource`]: the handle an MCP server holds
//!
//! The crate has no transport code; see `mcp-openapi-server` for stdio / streamable HTTP.

pub mod binder;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod loader;
pub mod parser;
pub mod runtime;
pub mod schema;
pub mod semantics;
pub mod spec;

pub use config::ToolSourceConfig;
pub use error::{OpenApiToolsError, Result};
pub use runtime::{OpenApiToolSource, SourceOptions};
