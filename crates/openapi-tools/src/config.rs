use serde::{Deserialize, Serialize};

/// Configuration for an OpenAPI-based tool source.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSourceConfig {
    /// `OpenAPI` spec location (URL or file path).
    #[serde(default)]
    pub spec: String,

    /// Optional spec hash (`sha256:<hex>`) for version detection.
    #[serde(default)]
    pub spec_hash: Option<String>,

    /// Hash policy: warn, fail, or ignore.
    #[serde(default)]
    pub spec_hash_policy: HashPolicy,

    /// Override the base URL taken from the spec's first server entry.
    #[serde(default)]
    pub base_url: Option<String>,

    /// What to do with operations that cannot be turned into tools.
    #[serde(default)]
    pub build_policy: BuildPolicy,

    /// How non-2xx upstream responses are reported.
    #[serde(default)]
    pub status_policy: StatusPolicy,

    /// How body argument values are encoded in the JSON request body.
    #[serde(default)]
    pub body_encoding: BodyEncoding,

    /// Per-call upstream timeout in seconds (`0` or unset = no timeout).
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ToolSourceConfig {
    #[must_use]
    pub fn new(spec: impl Into<String>) -> Self {
        Self {
            spec: spec.into(),
            ..Self::default()
        }
    }
}

/// Hash verification policy.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HashPolicy {
    /// Log warning if hash doesn't match.
    #[default]
    Warn,
    /// Fail startup if hash doesn't match.
    Fail,
    /// Ignore hash verification.
    Ignore,
}

/// Catalog build policy for operation-scoped errors (unsupported types or bodies, duplicate
/// argument names). Missing operation ids are always fatal.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BuildPolicy {
    /// Abort the whole build; nothing is published.
    #[default]
    FailClosed,
    /// Log and skip the offending operation.
    SkipOperation,
}

/// Reporting of non-2xx upstream responses.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusPolicy {
    /// Return the response body as the tool result whatever the status.
    #[default]
    Passthrough,
    /// Report non-2xx responses as tool errors (status + body).
    Error,
}

/// Encoding of body argument values.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    /// Every value is sent as its string form (`true` -> `"true"`).
    #[default]
    String,
    /// Values are forwarded as the JSON the caller supplied.
    Json,
}
