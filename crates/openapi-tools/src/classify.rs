//! Parameter classification.
//!
//! Turns an operation's declared parameters and (object) request body into one flat,
//! order-preserving argument namespace, recording where each argument goes in the HTTP request.

use crate::error::{OpenApiToolsError, Result};
use crate::spec::{Operation, Schema, SchemaKind};

/// Where an argument is placed in the outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Path,
    Query,
    Body,
}

impl Placement {
    fn as_str(self) -> &'static str {
        match self {
            Placement::Path => "path",
            Placement::Query => "query",
            Placement::Body => "body",
        }
    }
}

/// One planned tool argument.
#[derive(Debug, Clone)]
pub struct PlannedArgument {
    pub name: String,
    pub placement: Placement,
    pub schema: Schema,
    pub required: bool,
}

/// Ordered argument plan of one operation: path, then query, then body arguments.
#[derive(Debug, Clone, Default)]
pub struct ParameterPlan {
    arguments: Vec<PlannedArgument>,
}

impl ParameterPlan {
    #[must_use]
    pub fn arguments(&self) -> &[PlannedArgument] {
        &self.arguments
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PlannedArgument> {
        self.arguments.iter().find(|a| a.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.arguments.iter().map(|a| a.name.as_str())
    }

    /// Required argument names, in plan order.
    pub fn required_names(&self) -> impl Iterator<Item = &str> {
        self.arguments
            .iter()
            .filter(|a| a.required)
            .map(|a| a.name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    fn push(&mut self, operation_id: &str, arg: PlannedArgument) -> Result<()> {
        if self.get(&arg.name).is_some() {
            return Err(OpenApiToolsError::DuplicateParameterName {
                operation_id: operation_id.to_string(),
                name: arg.name,
            });
        }
        self.arguments.push(arg);
        Ok(())
    }
}

/// Classify an operation's arguments.
///
/// # Errors
///
/// - [`OpenApiToolsError::UnsupportedBodyShape`] if a request body content entry is not an
///   object schema.
/// - [`OpenApiToolsError::DuplicateParameterName`] if two sources produce the same argument name.
pub fn classify(operation: &Operation, path_template: &str) -> Result<ParameterPlan> {
    let operation_id = operation.operation_id.as_deref().unwrap_or_default();
    let mut plan = ParameterPlan::default();

    let (path_params, query_params): (Vec<_>, Vec<_>) = operation
        .parameters
        .iter()
        .partition(|p| path_template.contains(&format!("{{{}}}", p.name)));

    for p in path_params {
        plan.push(
            operation_id,
            PlannedArgument {
                name: p.name.clone(),
                placement: Placement::Path,
                schema: parameter_schema(&p.schema, p.description.as_deref()),
                required: true,
            },
        )?;
    }

    for p in query_params {
        plan.push(
            operation_id,
            PlannedArgument {
                name: p.name.clone(),
                placement: Placement::Query,
                schema: parameter_schema(&p.schema, p.description.as_deref()),
                required: p.required,
            },
        )?;
    }

    let Some(body) = &operation.request_body else {
        return Ok(plan);
    };

    for media in &body.content {
        let SchemaKind::Object {
            properties,
            required,
        } = &media.schema.kind
        else {
            return Err(OpenApiToolsError::UnsupportedBodyShape {
                operation_id: operation_id.to_string(),
                content_type: media.content_type.clone(),
                kind: media.schema.kind.label(),
            });
        };

        for prop in properties {
            // Alternative encodings of the same body repeat the same properties.
            if plan
                .get(&prop.name)
                .is_some_and(|a| a.placement == Placement::Body)
            {
                continue;
            }
            plan.push(
                operation_id,
                PlannedArgument {
                    name: prop.name.clone(),
                    placement: Placement::Body,
                    schema: prop.schema.clone(),
                    required: required.contains(&prop.name),
                },
            )?;
        }
    }

    tracing::trace!(
        operation_id,
        arguments = ?plan
            .arguments
            .iter()
            .map(|a| format!("{}:{}", a.placement.as_str(), a.name))
            .collect::<Vec<_>>(),
        "classified operation arguments"
    );

    Ok(plan)
}

/// Parameter descriptions live on the parameter, not its schema; fold them in.
fn parameter_schema(schema: &Schema, description: Option<&str>) -> Schema {
    let mut schema = schema.clone();
    if schema.meta.description.is_none()
        && let Some(desc) = description
    {
        schema.meta.description = Some(desc.to_string());
    }
    schema
}
