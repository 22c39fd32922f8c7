//! `OpenAPI` tool source: the catalog plus a dispatcher, behind one cheap-to-clone handle.

use crate::binder::bind;
use crate::catalog::{self, Catalog, ToolDescriptor};
use crate::config::{BodyEncoding, BuildPolicy, StatusPolicy, ToolSourceConfig};
use crate::dispatch::{HttpDispatcher, resolve_base_url};
use crate::error::{OpenApiToolsError, Result};
use crate::loader;
use crate::semantics::annotations_for_method;
use crate::spec::Specification;
use reqwest::Client;
use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Options for [`OpenApiToolSource::from_spec`].
#[derive(Debug, Clone, Default)]
pub struct SourceOptions {
    pub base_url: Option<String>,
    pub build_policy: BuildPolicy,
    pub status_policy: StatusPolicy,
    pub body_encoding: BodyEncoding,
    pub timeout: Option<Duration>,
}

impl From<&ToolSourceConfig> for SourceOptions {
    fn from(cfg: &ToolSourceConfig) -> Self {
        Self {
            base_url: cfg.base_url.clone(),
            build_policy: cfg.build_policy,
            status_policy: cfg.status_policy,
            body_encoding: cfg.body_encoding,
            timeout: cfg
                .timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }
}

/// Tools generated from one `OpenAPI` document.
///
/// Built once; everything inside is immutable afterwards, so clones share one catalog and one
/// connection pool.
#[derive(Debug, Clone)]
pub struct OpenApiToolSource {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    title: String,
    version: String,
    description: Option<String>,
    catalog: Catalog,
    dispatcher: HttpDispatcher,
    body_encoding: BodyEncoding,
}

impl OpenApiToolSource {
    /// Load the spec named by `config`, then build the catalog and dispatcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the spec cannot be loaded, fails hash verification under
    /// `HashPolicy::Fail`, or cannot be turned into a catalog.
    pub async fn load(config: &ToolSourceConfig) -> Result<Self> {
        let client = Client::new();
        let content = loader::load_document(&config.spec, &client).await?;
        loader::verify_hash(
            &content,
            config.spec_hash.as_deref(),
            config.spec_hash_policy,
            &config.spec,
        )?;
        let spec = loader::parse_document(&content, &config.spec)?;
        Self::build(&spec, &config.spec, &SourceOptions::from(config), client)
    }

    /// Build from an already parsed spec. `source` is where it came from (used to resolve
    /// relative server URLs).
    ///
    /// # Errors
    ///
    /// Returns base URL resolution and catalog build errors.
    pub fn from_spec(spec: &Specification, source: &str, options: &SourceOptions) -> Result<Self> {
        Self::build(spec, source, options, Client::new())
    }

    fn build(
        spec: &Specification,
        source: &str,
        options: &SourceOptions,
        client: Client,
    ) -> Result<Self> {
        let base_url = resolve_base_url(spec, source, options.base_url.as_deref())?;
        let catalog = catalog::build(spec, options.build_policy)?;

        tracing::info!(
            title = %spec.info.title,
            base_url = %base_url,
            tools = catalog.tools.len(),
            "OpenAPI tool source ready"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                title: spec.info.title.clone(),
                version: spec.info.version.clone(),
                description: spec.info.description.clone(),
                catalog,
                dispatcher: HttpDispatcher::new(
                    client,
                    base_url,
                    options.status_policy,
                    options.timeout,
                ),
                body_encoding: options.body_encoding,
            }),
        })
    }

    /// Raw tool descriptors, in document order.
    #[must_use]
    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.inner.catalog.tools
    }

    /// The MCP `Tool`s exposed by this source, in document order.
    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        let catalog = &self.inner.catalog;
        catalog
            .tools
            .iter()
            .map(|d| {
                let mut tool = Tool::new(
                    d.name.clone(),
                    d.description.clone(),
                    Arc::new(d.input_schema.clone()),
                );
                tool.annotations = catalog
                    .routes
                    .get(&d.name)
                    .map(|r| annotations_for_method(r.method));
                tool
            })
            .collect()
    }

    /// Execute a tool call: look up the route, bind the arguments, send one request.
    ///
    /// # Errors
    ///
    /// - [`OpenApiToolsError::UnknownTool`] if `name` is not in the catalog.
    /// - [`OpenApiToolsError::MissingRequiredArguments`] if binding fails (nothing is sent).
    /// - [`OpenApiToolsError::Request`] / [`OpenApiToolsError::UpstreamStatus`] from dispatch.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult> {
        let route = self
            .inner
            .catalog
            .routes
            .get(name)
            .ok_or_else(|| OpenApiToolsError::UnknownTool(name.to_string()))?;

        let arguments = arguments.unwrap_or_default();
        let request = bind(route, &arguments, self.inner.body_encoding)?;
        let text = self.inner.dispatcher.dispatch(&request).await?;

        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        self.inner.dispatcher.base_url()
    }

    /// `info.title` of the source document.
    #[must_use]
    pub fn spec_title(&self) -> &str {
        &self.inner.title
    }

    #[must_use]
    pub fn spec_version(&self) -> &str {
        &self.inner.version
    }

    #[must_use]
    pub fn spec_description(&self) -> Option<&str> {
        self.inner.description.as_deref()
    }
}
