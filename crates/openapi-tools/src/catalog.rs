//! Tool catalog: one tool descriptor and one route per operation.

use crate::classify::{ParameterPlan, PlannedArgument, classify};
use crate::config::BuildPolicy;
use crate::error::{OpenApiToolsError, Result};
use crate::schema::{self, insert_meta, schema_to_json};
use crate::spec::{HttpMethod, Operation, SchemaKind, Specification};
use rmcp::model::JsonObject;
use serde_json::{Map, Value, json};
use std::collections::HashMap;

/// What a client sees for one tool.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// JSON Schema object: `{"type": "object", "properties": {...}, "required": [...]}`.
    pub input_schema: JsonObject,
}

/// Where a tool call goes.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub operation_id: String,
    pub method: HttpMethod,
    /// Unsubstituted path template, exactly as declared.
    pub path_template: String,
    pub plan: ParameterPlan,
    /// The operation declares a `requestBody`.
    pub has_body: bool,
}

/// Tool name -> route.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, RouteEntry>,
}

impl RouteTable {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RouteEntry> {
        self.routes.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.routes.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Built catalog. `tools` and `routes` cover exactly the same names.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub tools: Vec<ToolDescriptor>,
    pub routes: RouteTable,
}

/// Build the catalog for every operation of `spec`, in document order.
///
/// # Errors
///
/// - [`OpenApiToolsError::MissingOperationId`] for any operation without an id.
/// - Operation-scoped errors (see [`OpenApiToolsError::is_operation_scoped`]) under
///   [`BuildPolicy::FailClosed`].
pub fn build(spec: &Specification, policy: BuildPolicy) -> Result<Catalog> {
    let mut catalog = Catalog::default();
    let mut skipped = 0usize;

    for item in &spec.paths {
        for op in &item.operations {
            let Some(operation_id) = op.operation_id.as_deref() else {
                return Err(OpenApiToolsError::MissingOperationId {
                    method: op.method.to_string(),
                    path: item.url.clone(),
                });
            };

            if catalog.routes.contains(operation_id) {
                tracing::warn!(
                    tool = operation_id,
                    method = %op.method,
                    path = %item.url,
                    "Tool {operation_id} already exists, skipping"
                );
                skipped += 1;
                continue;
            }

            let (descriptor, route) = match build_tool(operation_id, op, &item.url) {
                Ok(built) => built,
                Err(e) if e.is_operation_scoped() && policy == BuildPolicy::SkipOperation => {
                    tracing::warn!(
                        tool = operation_id,
                        method = %op.method,
                        path = %item.url,
                        error = %e,
                        "skipping operation"
                    );
                    skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            tracing::debug!(
                tool = operation_id,
                method = %route.method,
                path = %route.path_template,
                arguments = route.plan.len(),
                "registered tool"
            );
            catalog.routes.routes.insert(operation_id.to_string(), route);
            catalog.tools.push(descriptor);
        }
    }

    tracing::info!(
        tools = catalog.tools.len(),
        skipped,
        title = %spec.info.title,
        "built tool catalog"
    );
    Ok(catalog)
}

fn build_tool(
    operation_id: &str,
    op: &Operation,
    path_template: &str,
) -> Result<(ToolDescriptor, RouteEntry)> {
    let plan = classify(op, path_template)?;
    let input_schema = input_schema(&plan)?;

    let descriptor = ToolDescriptor {
        name: operation_id.to_string(),
        description: op.tool_description(),
        input_schema,
    };
    let route = RouteEntry {
        operation_id: operation_id.to_string(),
        method: op.method,
        path_template: path_template.to_string(),
        plan,
        has_body: op.request_body.is_some(),
    };
    Ok((descriptor, route))
}

/// Object input schema for a plan: one property per planned argument.
///
/// # Errors
///
/// Returns [`OpenApiToolsError::UnsupportedType`] if an argument's schema has no usable type.
pub fn input_schema(plan: &ParameterPlan) -> Result<JsonObject> {
    let mut properties = Map::new();
    for arg in plan.arguments() {
        properties.insert(arg.name.clone(), argument_schema(arg)?);
    }
    let required: Vec<&str> = plan.required_names().collect();

    let mut out = JsonObject::new();
    out.insert("type".to_string(), json!("object"));
    out.insert("properties".to_string(), Value::Object(properties));
    out.insert("required".to_string(), json!(required));
    Ok(out)
}

fn argument_schema(arg: &PlannedArgument) -> Result<Value> {
    let kind = schema::map(&arg.name, &arg.schema)?;

    let mut out = Map::new();
    out.insert("title".to_string(), json!(arg.name));
    out.insert("type".to_string(), json!(kind.json_type()));
    insert_meta(&mut out, &arg.schema.meta);
    // Echo only; the object-level `required` list is what clients enforce.
    if arg.required {
        out.insert("required".to_string(), json!(true));
    }

    match &arg.schema.kind {
        SchemaKind::Array { items: Some(items) } if schema::map(&arg.name, items).is_ok() => {
            out.insert("items".to_string(), schema_to_json(items));
        }
        SchemaKind::Object { .. } => {
            if let Some(props) = schema_to_json(&arg.schema).get("properties") {
                out.insert("properties".to_string(), props.clone());
            }
        }
        _ => {}
    }

    Ok(Value::Object(out))
}
