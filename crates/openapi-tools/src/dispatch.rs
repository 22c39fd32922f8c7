//! Outbound HTTP.

use crate::binder::{BoundRequest, percent_encode};
use crate::config::StatusPolicy;
use crate::error::{OpenApiToolsError, Result};
use crate::spec::Specification;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Resolve the upstream base URL.
///
/// `override_url` wins over the spec's first server. Relative server URLs (e.g. `/api`) are
/// joined onto `source` when the spec was loaded from an http(s) URL.
///
/// # Errors
///
/// - [`OpenApiToolsError::NoServerDeclared`] if there is neither a server nor an override.
/// - [`OpenApiToolsError::InvalidBaseUrl`] if the result is not an absolute http(s) URL.
pub fn resolve_base_url(
    spec: &Specification,
    source: &str,
    override_url: Option<&str>,
) -> Result<Url> {
    let candidate = match override_url {
        Some(u) => u,
        None => spec
            .servers
            .first()
            .map(|s| s.url.as_str())
            .ok_or(OpenApiToolsError::NoServerDeclared)?,
    };

    let invalid = |message: String| OpenApiToolsError::InvalidBaseUrl {
        url: candidate.to_string(),
        message,
    };

    if candidate.starts_with("http://") || candidate.starts_with("https://") {
        return Url::parse(candidate).map_err(|e| invalid(e.to_string()));
    }

    if source.starts_with("http://") || source.starts_with("https://") {
        let mut source_url = Url::parse(source).map_err(|e| {
            invalid(format!("cannot parse spec location '{source}': {e}"))
        })?;
        source_url.set_fragment(None);
        return source_url.join(candidate).map_err(|e| invalid(e.to_string()));
    }

    Err(invalid(
        "must be an absolute http(s) URL when the spec is not loaded from a URL (set baseUrl explicitly)"
            .to_string(),
    ))
}

/// Sends bound requests to the upstream API.
#[derive(Debug, Clone)]
pub struct HttpDispatcher {
    client: Client,
    base_url: Url,
    status_policy: StatusPolicy,
    timeout: Option<Duration>,
}

impl HttpDispatcher {
    #[must_use]
    pub fn new(
        client: Client,
        base_url: Url,
        status_policy: StatusPolicy,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            client,
            base_url,
            status_policy,
            timeout,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL + bound path, with the query string appended.
    ///
    /// # Errors
    ///
    /// Returns [`OpenApiToolsError::Request`] if the joined URL does not parse.
    pub fn build_url(&self, request: &BoundRequest) -> Result<Url> {
        let url = format!(
            "{}{}",
            self.base_url.as_str().trim_end_matches('/'),
            request.path
        );
        let mut url =
            Url::parse(&url).map_err(|e| OpenApiToolsError::Request(format!("Invalid URL: {e}")))?;

        if !request.query_params.is_empty() {
            let query = request
                .query_params
                .iter()
                .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(Some(&query));
        }

        Ok(url)
    }

    /// Send one request and return the response body as text.
    ///
    /// # Errors
    ///
    /// - [`OpenApiToolsError::Request`] on connection failure, timeout or unreadable body.
    /// - [`OpenApiToolsError::UpstreamStatus`] for non-2xx responses under
    ///   [`StatusPolicy::Error`].
    pub async fn dispatch(&self, request: &BoundRequest) -> Result<String> {
        let url = self.build_url(request)?;
        tracing::debug!(method = %request.method, url = %redact_url(&url), "dispatching request");

        let mut builder = self.client.request(request.method.to_reqwest(), url);
        if request.has_body || !request.body_params.is_empty() {
            builder = builder.json(&request.body_params);
        }
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| OpenApiToolsError::Request(sanitize_reqwest_error(&e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OpenApiToolsError::Request(sanitize_reqwest_error(&e)))?;

        if !status.is_success() {
            if self.status_policy == StatusPolicy::Error {
                return Err(OpenApiToolsError::UpstreamStatus {
                    status: status.as_u16(),
                    body,
                });
            }
            tracing::debug!(status = status.as_u16(), "upstream returned non-success status");
        }

        Ok(body)
    }
}

/// URL without credentials, query or fragment.
#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.set_fragment(None);
    u.to_string()
}

/// `reqwest` error text with the request URL redacted.
#[must_use]
pub fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    if let Some(u) = e.url() {
        msg = msg.replace(u.as_str(), &redact_url(u));
    }
    msg
}
