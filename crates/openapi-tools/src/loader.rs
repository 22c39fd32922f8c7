//! Spec loading: fetch or read, verify the optional hash, parse.

use crate::config::HashPolicy;
use crate::dispatch::sanitize_reqwest_error;
use crate::error::{OpenApiToolsError, Result};
use crate::parser;
use crate::spec::Specification;
use openapiv3::OpenAPI;
use reqwest::Client;
use sha2::{Digest, Sha256};

/// Whether a spec location is fetched over HTTP rather than read from disk.
#[must_use]
pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Read the raw spec text from a URL or a file path.
///
/// # Errors
///
/// Returns [`OpenApiToolsError::OpenApiSpecFetch`] or [`OpenApiToolsError::OpenApiSpecReadFile`].
pub async fn load_document(location: &str, client: &Client) -> Result<String> {
    if is_remote(location) {
        tracing::info!(url = location, "Fetching OpenAPI spec");
        let fetch_err = |e: &reqwest::Error| OpenApiToolsError::OpenApiSpecFetch {
            url: location.to_string(),
            message: sanitize_reqwest_error(e),
        };

        let resp = client
            .get(location)
            .send()
            .await
            .map_err(|e| fetch_err(&e))?
            .error_for_status()
            .map_err(|e| fetch_err(&e))?;
        resp.text().await.map_err(|e| fetch_err(&e))
    } else {
        tracing::info!(path = location, "Loading OpenAPI spec");
        tokio::fs::read_to_string(location)
            .await
            .map_err(|e| OpenApiToolsError::OpenApiSpecReadFile {
                path: location.to_string(),
                source: e,
            })
    }
}

/// `sha256:<hex>` digest of a spec document.
#[must_use]
pub fn spec_hash(content: &str) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(content.as_bytes())))
}

/// Compare the document hash against `expected`, applying `policy` on mismatch.
///
/// # Errors
///
/// Returns [`OpenApiToolsError::OpenApi`] on mismatch under [`HashPolicy::Fail`].
pub fn verify_hash(
    content: &str,
    expected: Option<&str>,
    policy: HashPolicy,
    location: &str,
) -> Result<()> {
    let Some(expected) = expected else {
        return Ok(());
    };
    if policy == HashPolicy::Ignore {
        return Ok(());
    }

    let actual = spec_hash(content);
    if actual == expected {
        return Ok(());
    }

    match policy {
        HashPolicy::Fail => Err(OpenApiToolsError::OpenApi(format!(
            "Spec hash mismatch for '{location}'. Expected: {expected}, Got: {actual}",
        ))),
        HashPolicy::Warn => {
            tracing::warn!(
                location,
                expected,
                actual = %actual,
                "Spec hash mismatch"
            );
            Ok(())
        }
        HashPolicy::Ignore => Ok(()),
    }
}

/// Parse spec text (JSON or YAML) into the domain model.
///
/// # Errors
///
/// Returns [`OpenApiToolsError::OpenApiSpecParse`] for malformed documents, or the
/// reference-resolution errors of the parser.
pub fn parse_document(content: &str, location: &str) -> Result<Specification> {
    // JSON is a valid subset of YAML, so serde_yaml alone is enough.
    let api: OpenAPI =
        serde_yaml::from_str(content).map_err(|e| OpenApiToolsError::OpenApiSpecParse {
            location: location.to_string(),
            source: e,
        })?;
    parser::parse(&api)
}
