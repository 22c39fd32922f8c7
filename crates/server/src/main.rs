//! `mcp-openapi`: expose an OpenAPI-described HTTP API as MCP tools.

mod http;
mod server;
mod settings;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use mcp_openapi_tools::OpenApiToolSource;
use rmcp::ServiceExt as _;
use server::OpenApiServer;
use settings::{BuildPolicyArg, Overrides, StatusPolicyArg};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Parser)]
#[command(name = "mcp-openapi", version, about)]
struct Cli {
    /// `OpenAPI` document location (http(s) URL or file path).
    #[arg(long, env = "MCP_OPENAPI_OPENAPI_URL", global = true)]
    openapi_url: Option<String>,

    /// YAML tool source config (`spec`, `baseUrl`, `statusPolicy`, ...). Flags win over it.
    #[arg(long, env = "MCP_OPENAPI_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Upstream base URL, instead of the document's first server.
    #[arg(long, env = "MCP_OPENAPI_BASE_URL", global = true)]
    base_url: Option<String>,

    #[arg(long, env = "MCP_OPENAPI_STATUS_POLICY", value_enum, global = true)]
    status_policy: Option<StatusPolicyArg>,

    #[arg(long, env = "MCP_OPENAPI_BUILD_POLICY", value_enum, global = true)]
    build_policy: Option<BuildPolicyArg>,

    /// Log filter (`RUST_LOG` syntax); `RUST_LOG` itself takes precedence.
    #[arg(long, env = "MCP_OPENAPI_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    #[arg(
        long,
        env = "MCP_OPENAPI_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Text,
        global = true
    )]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve MCP over stdin/stdout.
    Stdio,
    /// Serve MCP over streamable HTTP at `/mcp`.
    #[command(alias = "sse")]
    Http {
        #[arg(long, env = "MCP_OPENAPI_BIND", default_value = "127.0.0.1:8000")]
        bind: SocketAddr,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(level: &str, format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log filter '{level}'"))?;

    // stdout carries the stdio transport; logs always go to stderr.
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_ansi(false))
            .try_init()?,
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format)?;

    let config = settings::resolve(
        cli.config.as_deref(),
        &Overrides {
            openapi_url: cli.openapi_url.clone(),
            base_url: cli.base_url.clone(),
            status_policy: cli.status_policy,
            build_policy: cli.build_policy,
        },
    )?;

    let source = OpenApiToolSource::load(&config)
        .await
        .with_context(|| format!("load OpenAPI tool source from '{}'", config.spec))?;

    match cli.command {
        Command::Stdio => {
            tracing::info!(tools = source.descriptors().len(), "serving MCP over stdio");
            let service = OpenApiServer::new(source)
                .serve(rmcp::transport::stdio())
                .await
                .context("start stdio MCP session")?;
            service.waiting().await?;
        }
        Command::Http { bind } => http::serve(source, bind).await?,
    }

    Ok(())
}
