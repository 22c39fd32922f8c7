//! Effective tool source settings: `--config` YAML file, then command-line flags on top.

use anyhow::Context as _;
use clap::ValueEnum;
use mcp_openapi_tools::config::{BuildPolicy, StatusPolicy, ToolSourceConfig};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusPolicyArg {
    Passthrough,
    Error,
}

impl From<StatusPolicyArg> for StatusPolicy {
    fn from(v: StatusPolicyArg) -> Self {
        match v {
            StatusPolicyArg::Passthrough => StatusPolicy::Passthrough,
            StatusPolicyArg::Error => StatusPolicy::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BuildPolicyArg {
    FailClosed,
    SkipOperation,
}

impl From<BuildPolicyArg> for BuildPolicy {
    fn from(v: BuildPolicyArg) -> Self {
        match v {
            BuildPolicyArg::FailClosed => BuildPolicy::FailClosed,
            BuildPolicyArg::SkipOperation => BuildPolicy::SkipOperation,
        }
    }
}

/// Flag values that override the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub openapi_url: Option<String>,
    pub base_url: Option<String>,
    pub status_policy: Option<StatusPolicyArg>,
    pub build_policy: Option<BuildPolicyArg>,
}

/// Merge the optional config file with flag overrides.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed, or if no spec location is
/// configured at all.
pub fn resolve(
    config_path: Option<&Path>,
    overrides: &Overrides,
) -> anyhow::Result<ToolSourceConfig> {
    let mut cfg = match config_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("read config file {}", path.display()))?;
            serde_yaml::from_str::<ToolSourceConfig>(&raw)
                .with_context(|| format!("parse config file {}", path.display()))?
        }
        None => ToolSourceConfig::default(),
    };

    if let Some(url) = &overrides.openapi_url {
        cfg.spec.clone_from(url);
    }
    if let Some(url) = &overrides.base_url {
        cfg.base_url = Some(url.clone());
    }
    if let Some(policy) = overrides.status_policy {
        cfg.status_policy = policy.into();
    }
    if let Some(policy) = overrides.build_policy {
        cfg.build_policy = policy.into();
    }

    anyhow::ensure!(
        !cfg.spec.trim().is_empty(),
        "no OpenAPI spec configured (pass --openapi-url or set `spec` in --config)"
    );
    Ok(cfg)
}
