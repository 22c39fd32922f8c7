//! Request binding: tool arguments + route -> concrete request parts.

use crate::catalog::RouteEntry;
use crate::classify::{ParameterPlan, Placement};
use crate::config::BodyEncoding;
use crate::error::{OpenApiToolsError, Result};
use crate::spec::HttpMethod;
use rmcp::model::JsonObject;
use serde_json::Value;

/// A fully bound upstream request, relative to the base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundRequest {
    pub method: HttpMethod,
    /// Path template with every placeholder substituted.
    pub path: String,
    pub query_params: Vec<(String, String)>,
    pub body_params: JsonObject,
    /// The operation declares a request body, so a JSON object is sent even when empty.
    pub has_body: bool,
}

/// Bind invocation arguments to a route.
///
/// Arguments that are not in the route's plan are ignored.
///
/// # Errors
///
/// - [`OpenApiToolsError::MissingRequiredArguments`] naming every required argument that was
///   not supplied. A JSON `null` counts as not supplied.
/// - [`OpenApiToolsError::InvalidPathArgument`] for a path value of `.` or `..`.
pub fn bind(
    route: &RouteEntry,
    arguments: &JsonObject,
    encoding: BodyEncoding,
) -> Result<BoundRequest> {
    check_required(&route.plan, arguments)?;

    let unknown: Vec<&str> = arguments
        .keys()
        .map(String::as_str)
        .filter(|k| route.plan.get(k).is_none())
        .collect();
    if !unknown.is_empty() {
        tracing::debug!(
            operation_id = %route.operation_id,
            ?unknown,
            "ignoring arguments that are not part of the operation"
        );
    }

    Ok(BoundRequest {
        method: route.method,
        path: substitute_path(&route.path_template, &route.plan, arguments)?,
        query_params: collect_query(&route.plan, arguments),
        body_params: collect_body(&route.plan, arguments, encoding)?,
        has_body: route.has_body,
    })
}

/// Aggregate required-argument check, in plan order.
///
/// # Errors
///
/// Returns [`OpenApiToolsError::MissingRequiredArguments`] if any required argument is absent.
pub fn check_required(plan: &ParameterPlan, arguments: &JsonObject) -> Result<()> {
    let missing: Vec<String> = plan
        .required_names()
        .filter(|name| supplied(arguments, name).is_none())
        .map(str::to_string)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(OpenApiToolsError::MissingRequiredArguments(missing))
    }
}

/// Replace `{name}` placeholders with percent-encoded argument values.
///
/// # Errors
///
/// Returns [`OpenApiToolsError::InvalidPathArgument`] for `.` and `..`: URL parsing treats them
/// as dot segments (encoded or not), which would move the request to another path.
pub fn substitute_path(
    template: &str,
    plan: &ParameterPlan,
    arguments: &JsonObject,
) -> Result<String> {
    let mut path = template.to_string();
    for arg in plan
        .arguments()
        .iter()
        .filter(|a| a.placement == Placement::Path)
    {
        if let Some(value) = supplied(arguments, &arg.name) {
            let value = value_to_string(value);
            if value == "." || value == ".." {
                return Err(OpenApiToolsError::InvalidPathArgument {
                    name: arg.name.clone(),
                    value,
                });
            }
            path = path.replace(&format!("{{{}}}", arg.name), &percent_encode(&value));
        }
    }
    Ok(path)
}

/// Query pairs for every supplied query argument, in plan order (unencoded).
#[must_use]
pub fn collect_query(plan: &ParameterPlan, arguments: &JsonObject) -> Vec<(String, String)> {
    plan.arguments()
        .iter()
        .filter(|a| a.placement == Placement::Query)
        .filter_map(|a| supplied(arguments, &a.name).map(|v| (a.name.clone(), value_to_string(v))))
        .collect()
}

/// Body object for every supplied body argument.
///
/// # Errors
///
/// Returns [`OpenApiToolsError::MissingRequiredArguments`] with the first required body
/// property that is absent.
pub fn collect_body(
    plan: &ParameterPlan,
    arguments: &JsonObject,
    encoding: BodyEncoding,
) -> Result<JsonObject> {
    let mut body = JsonObject::new();
    for arg in plan
        .arguments()
        .iter()
        .filter(|a| a.placement == Placement::Body)
    {
        match supplied(arguments, &arg.name) {
            Some(value) => {
                let value = match encoding {
                    BodyEncoding::String => Value::String(value_to_string(value)),
                    BodyEncoding::Json => value.clone(),
                };
                body.insert(arg.name.clone(), value);
            }
            None if arg.required => {
                return Err(OpenApiToolsError::MissingRequiredArguments(vec![
                    arg.name.clone(),
                ]));
            }
            None => {}
        }
    }
    Ok(body)
}

fn supplied<'a>(arguments: &'a JsonObject, name: &str) -> Option<&'a Value> {
    arguments.get(name).filter(|v| !v.is_null())
}

/// String form of an argument value. Arrays and objects use their JSON text.
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}

/// Percent-encode everything except RFC 3986 unreserved characters.
pub(crate) fn percent_encode(s: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        if matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~') {
            out.push(b as char);
        } else {
            out.push('%');
            out.push(HEX[(b >> 4) as usize] as char);
            out.push(HEX[(b & 0x0F) as usize] as char);
        }
    }
    out
}
