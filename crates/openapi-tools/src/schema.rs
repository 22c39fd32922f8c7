//! Schema type mapping.
//!
//! Maps resolved `OpenAPI` schemas onto the small set of value kinds a tool argument can have,
//! and renders schemas as JSON Schema fragments.

use crate::error::{OpenApiToolsError, Result};
use crate::spec::{Schema, SchemaKind, SchemaMeta};
use serde_json::{Map, Value, json};

/// Generic value kind of a tool argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    String,
    Boolean,
    /// Array of arbitrary values.
    Array,
    /// String-keyed map of arbitrary values.
    Object,
    Number,
    Null,
}

impl ValueKind {
    /// The JSON Schema `type` keyword for this kind.
    #[must_use]
    pub fn json_type(self) -> &'static str {
        match self {
            ValueKind::Integer => "integer",
            ValueKind::String => "string",
            ValueKind::Boolean => "boolean",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
            ValueKind::Number => "number",
            ValueKind::Null => "null",
        }
    }
}

/// Map a schema to its value kind.
///
/// # Errors
///
/// Returns [`OpenApiToolsError::UnsupportedType`] when the schema has no usable `type`.
/// `name` is only used for the error message.
pub fn map(name: &str, schema: &Schema) -> Result<ValueKind> {
    match &schema.kind {
        SchemaKind::Integer => Ok(ValueKind::Integer),
        SchemaKind::String => Ok(ValueKind::String),
        SchemaKind::Boolean => Ok(ValueKind::Boolean),
        SchemaKind::Array { .. } => Ok(ValueKind::Array),
        SchemaKind::Object { .. } => Ok(ValueKind::Object),
        SchemaKind::Number => Ok(ValueKind::Number),
        SchemaKind::Null => Ok(ValueKind::Null),
        SchemaKind::Untyped { reason } => Err(OpenApiToolsError::UnsupportedType {
            name: name.to_string(),
            kind: reason.clone(),
        }),
    }
}

/// Render a schema as a JSON Schema fragment (used for array items and nested objects).
///
/// Untyped nested schemas render as `{}` (accept anything) instead of failing: only the
/// top-level argument type is load-bearing for binding.
#[must_use]
pub fn schema_to_json(schema: &Schema) -> Value {
    let mut out = Map::new();

    match &schema.kind {
        SchemaKind::Array { items } => {
            out.insert("type".to_string(), json!("array"));
            if let Some(items) = items {
                out.insert("items".to_string(), schema_to_json(items));
            }
        }
        SchemaKind::Object {
            properties,
            required,
        } => {
            out.insert("type".to_string(), json!("object"));
            if !properties.is_empty() {
                let props: Map<String, Value> = properties
                    .iter()
                    .map(|p| (p.name.clone(), schema_to_json(&p.schema)))
                    .collect();
                out.insert("properties".to_string(), Value::Object(props));
            }
            if !required.is_empty() {
                out.insert("required".to_string(), json!(required));
            }
        }
        SchemaKind::Untyped { .. } => {}
        SchemaKind::Integer
        | SchemaKind::String
        | SchemaKind::Boolean
        | SchemaKind::Number
        | SchemaKind::Null => {
            if let Ok(kind) = map("", schema) {
                out.insert("type".to_string(), json!(kind.json_type()));
            }
        }
    }

    insert_meta(&mut out, &schema.meta);
    Value::Object(out)
}

/// Copy descriptive schema metadata into a JSON Schema object.
pub(crate) fn insert_meta(out: &mut Map<String, Value>, meta: &SchemaMeta) {
    if let Some(desc) = &meta.description {
        out.insert("description".to_string(), json!(desc));
    }
    if let Some(default) = &meta.default {
        out.insert("default".to_string(), default.clone());
    }
    if !meta.enumeration.is_empty() {
        out.insert("enum".to_string(), Value::Array(meta.enumeration.clone()));
    }
    if let Some(example) = &meta.example {
        out.insert("examples".to_string(), json!([example]));
    }
    if meta.deprecated {
        out.insert("deprecated".to_string(), json!(true));
    }
    if meta.read_only {
        out.insert("readOnly".to_string(), json!(true));
    }
    if meta.write_only {
        out.insert("writeOnly".to_string(), json!(true));
    }
}
