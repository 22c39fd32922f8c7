//! `openapiv3` document -> [`Specification`].
//!
//! Only local references (`#/...`) are resolved. Lookups go through a JSON view of the document,
//! so any JSON pointer into it works, not just `#/components/...`.

use crate::error::{OpenApiToolsError, Result};
use crate::spec::{
    HttpMethod, Info, MediaType, Operation, Parameter, ParameterLocation, PathItem, Property,
    RequestBody, Schema, SchemaKind, SchemaMeta, Server, Specification,
};
use openapiv3::{OpenAPI, ParameterSchemaOrContent, ReferenceOr};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::HashSet;

/// Convert a deserialized `OpenAPI` document into the domain model.
///
/// # Errors
///
/// Returns [`OpenApiToolsError::OpenApi`] for external, unresolved or cyclic references
/// (recursive *schemas* are not an error: the recursion point becomes an untyped schema).
pub fn parse(api: &OpenAPI) -> Result<Specification> {
    let resolver = Resolver::new(api)?;

    let servers = api
        .servers
        .iter()
        .map(|s| Server {
            url: substitute_server_variables(s),
            description: s.description.clone(),
        })
        .collect();

    let mut paths = Vec::with_capacity(api.paths.paths.len());
    for (template, item) in &api.paths.paths {
        let item = resolver.resolve(item)?;
        paths.push(PathItem {
            url: template.clone(),
            operations: resolver.operations(template, &item)?,
        });
    }

    Ok(Specification {
        info: Info {
            title: api.info.title.clone(),
            version: api.info.version.clone(),
            description: api.info.description.clone(),
        },
        servers,
        paths,
    })
}

/// `{var}` placeholders in a server URL are replaced with the variable's default.
fn substitute_server_variables(server: &openapiv3::Server) -> String {
    let mut url = server.url.clone();
    if let Some(vars) = &server.variables {
        for (name, var) in vars {
            url = url.replace(&format!("{{{name}}}"), &var.default);
        }
    }
    url
}

struct Resolver {
    root: Value,
}

impl Resolver {
    fn new(api: &OpenAPI) -> Result<Self> {
        Ok(Self {
            root: serde_json::to_value(api)?,
        })
    }

    fn lookup(&self, reference: &str) -> Result<Value> {
        let Some(pointer) = reference.strip_prefix('#') else {
            return Err(OpenApiToolsError::OpenApi(format!(
                "External $ref is not supported: {reference}"
            )));
        };
        if !pointer.starts_with('/') {
            return Err(OpenApiToolsError::OpenApi(format!(
                "Unsupported $ref fragment (expected JSON pointer starting with '/'): {reference}",
            )));
        }
        self.root.pointer(pointer).cloned().ok_or_else(|| {
            OpenApiToolsError::OpenApi(format!("Unresolved $ref '{reference}'"))
        })
    }

    fn resolve<T>(&self, r: &ReferenceOr<T>) -> Result<T>
    where
        T: Clone + DeserializeOwned,
    {
        let mut seen: HashSet<String> = HashSet::new();
        let mut cur = r.clone();

        loop {
            match cur {
                ReferenceOr::Item(item) => return Ok(item),
                ReferenceOr::Reference { reference } => {
                    if !seen.insert(reference.clone()) {
                        return Err(OpenApiToolsError::OpenApi(format!(
                            "Cyclic $ref detected while resolving: {reference}",
                        )));
                    }
                    let value = self.lookup(&reference)?;
                    cur = serde_json::from_value(value).map_err(|e| {
                        OpenApiToolsError::OpenApi(format!(
                            "Failed to deserialize referenced value '{reference}': {e}"
                        ))
                    })?;
                }
            }
        }
    }

    fn operations(&self, template: &str, item: &openapiv3::PathItem) -> Result<Vec<Operation>> {
        let slots = [
            (HttpMethod::Get, &item.get),
            (HttpMethod::Put, &item.put),
            (HttpMethod::Post, &item.post),
            (HttpMethod::Delete, &item.delete),
            (HttpMethod::Options, &item.options),
            (HttpMethod::Head, &item.head),
            (HttpMethod::Patch, &item.patch),
            (HttpMethod::Trace, &item.trace),
        ];

        let mut out = Vec::new();
        for (method, op) in slots {
            let Some(op) = op else { continue };

            let parameters = self.merge_parameters(template, &item.parameters, &op.parameters)?;
            let request_body = op
                .request_body
                .as_ref()
                .map(|b| self.request_body(b))
                .transpose()?;

            out.push(Operation {
                operation_id: op.operation_id.clone(),
                method,
                summary: op.summary.clone(),
                description: op.description.clone(),
                parameters,
                request_body,
            });
        }
        Ok(out)
    }

    /// Path-item parameters first, overridden in place by operation parameters with the same
    /// name and location.
    fn merge_parameters(
        &self,
        template: &str,
        path_item_params: &[ReferenceOr<openapiv3::Parameter>],
        operation_params: &[ReferenceOr<openapiv3::Parameter>],
    ) -> Result<Vec<Parameter>> {
        let mut merged: Vec<Parameter> = Vec::new();

        for p in path_item_params.iter().chain(operation_params) {
            let Some(param) = self.parameter(template, &self.resolve(p)?)? else {
                continue;
            };
            match merged
                .iter()
                .position(|m| m.name == param.name && m.location == param.location)
            {
                Some(i) => merged[i] = param,
                None => merged.push(param),
            }
        }

        Ok(merged)
    }

    fn parameter(&self, template: &str, p: &openapiv3::Parameter) -> Result<Option<Parameter>> {
        let (location, data) = match p {
            openapiv3::Parameter::Path { parameter_data, .. } => {
                (ParameterLocation::Path, parameter_data)
            }
            openapiv3::Parameter::Query { parameter_data, .. } => {
                (ParameterLocation::Query, parameter_data)
            }
            openapiv3::Parameter::Header { parameter_data, .. }
            | openapiv3::Parameter::Cookie { parameter_data, .. } => {
                tracing::debug!(
                    path = template,
                    parameter = %parameter_data.name,
                    "dropping header/cookie parameter"
                );
                return Ok(None);
            }
        };

        let mut schema = match &data.format {
            ParameterSchemaOrContent::Schema(s) => self.schema(s, &mut Vec::new())?,
            ParameterSchemaOrContent::Content(content) => match content
                .values()
                .find_map(|m| m.schema.as_ref())
            {
                Some(s) => self.schema(s, &mut Vec::new())?,
                None => untyped("parameter content without schema"),
            },
        };
        if schema.meta.example.is_none() {
            schema.meta.example.clone_from(&data.example);
        }

        Ok(Some(Parameter {
            name: data.name.clone(),
            location,
            schema,
            required: data.required,
            description: data.description.clone(),
        }))
    }

    fn request_body(&self, body: &ReferenceOr<openapiv3::RequestBody>) -> Result<RequestBody> {
        let body = self.resolve(body)?;
        let mut content = Vec::with_capacity(body.content.len());
        for (content_type, media) in &body.content {
            let schema = match &media.schema {
                Some(s) => self.schema(s, &mut Vec::new())?,
                None => untyped("media type without schema"),
            };
            content.push(MediaType {
                content_type: content_type.clone(),
                schema,
            });
        }
        Ok(RequestBody {
            required: body.required,
            content,
        })
    }

    /// `stack` holds the schema references currently being expanded.
    fn schema(
        &self,
        s: &ReferenceOr<openapiv3::Schema>,
        stack: &mut Vec<String>,
    ) -> Result<Schema> {
        match s {
            ReferenceOr::Item(item) => self.schema_item(item, stack),
            ReferenceOr::Reference { reference } => self.schema_ref(reference, stack),
        }
    }

    fn boxed_schema(
        &self,
        s: &ReferenceOr<Box<openapiv3::Schema>>,
        stack: &mut Vec<String>,
    ) -> Result<Schema> {
        match s {
            ReferenceOr::Item(item) => self.schema_item(item, stack),
            ReferenceOr::Reference { reference } => self.schema_ref(reference, stack),
        }
    }

    fn schema_ref(&self, reference: &str, stack: &mut Vec<String>) -> Result<Schema> {
        if stack.iter().any(|r| r == reference) {
            return Ok(untyped(&format!("recursive $ref {reference}")));
        }

        let value = self.lookup(reference)?;
        let next: ReferenceOr<openapiv3::Schema> = serde_json::from_value(value).map_err(|e| {
            OpenApiToolsError::OpenApi(format!(
                "Failed to deserialize referenced schema '{reference}': {e}"
            ))
        })?;

        stack.push(reference.to_string());
        let out = self.schema(&next, stack);
        stack.pop();
        out
    }

    fn schema_item(&self, s: &openapiv3::Schema, stack: &mut Vec<String>) -> Result<Schema> {
        use openapiv3::{SchemaKind as K, Type};

        let data = &s.schema_data;
        let mut meta = SchemaMeta {
            title: data.title.clone(),
            description: data.description.clone(),
            default: data.default.clone(),
            enumeration: Vec::new(),
            example: data.example.clone(),
            deprecated: data.deprecated,
            read_only: data.read_only,
            write_only: data.write_only,
            nullable: data.nullable,
        };

        let kind = match &s.schema_kind {
            K::Type(Type::String(t)) => {
                meta.enumeration = t.enumeration.iter().flatten().map(|v| json!(v)).collect();
                SchemaKind::String
            }
            K::Type(Type::Integer(t)) => {
                meta.enumeration = t.enumeration.iter().flatten().map(|v| json!(v)).collect();
                SchemaKind::Integer
            }
            K::Type(Type::Number(t)) => {
                meta.enumeration = t.enumeration.iter().flatten().map(|v| json!(v)).collect();
                SchemaKind::Number
            }
            K::Type(Type::Boolean(_)) => SchemaKind::Boolean,
            K::Type(Type::Array(a)) => SchemaKind::Array {
                items: a
                    .items
                    .as_ref()
                    .map(|i| self.boxed_schema(i, stack).map(Box::new))
                    .transpose()?,
            },
            K::Type(Type::Object(o)) => SchemaKind::Object {
                properties: self.properties(&o.properties, stack)?,
                required: o.required.clone(),
            },
            K::OneOf { .. } => untyped_kind("oneOf"),
            K::AllOf { .. } => untyped_kind("allOf"),
            K::AnyOf { .. } => untyped_kind("anyOf"),
            K::Not { .. } => untyped_kind("not"),
            K::Any(any) => match any.typ.as_deref() {
                Some("null") => SchemaKind::Null,
                // `properties` without `type: object` is common enough to accept.
                None if !any.properties.is_empty() => SchemaKind::Object {
                    properties: self.properties(&any.properties, stack)?,
                    required: any.required.clone(),
                },
                Some(other) => untyped_kind(&format!("type '{other}'")),
                None => untyped_kind("no type"),
            },
        };

        Ok(Schema { kind, meta })
    }

    fn properties<'a>(
        &self,
        props: impl IntoIterator<Item = (&'a String, &'a ReferenceOr<Box<openapiv3::Schema>>)>,
        stack: &mut Vec<String>,
    ) -> Result<Vec<Property>> {
        props
            .into_iter()
            .map(|(name, schema)| {
                Ok(Property {
                    name: name.clone(),
                    schema: self.boxed_schema(schema, stack)?,
                })
            })
            .collect()
    }
}

fn untyped_kind(reason: &str) -> SchemaKind {
    SchemaKind::Untyped {
        reason: reason.to_string(),
    }
}

fn untyped(reason: &str) -> Schema {
    Schema::new(untyped_kind(reason))
}
