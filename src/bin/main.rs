use std::sync::Arc;
#[cfg(feature = "http")]
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto::Builder,
    service::TowerToHyperService,
};
#[cfg(feature = "http")]
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use clap::{Parser, ValueEnum};
use rmcp::service::{QuitReason, ServerInitializeError};
#[cfg(feature = "stdio")]
use rmcp::ServiceExt;
#[cfg(feature = "stdio")]
use rmcp::transport::stdio;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use mcp_obsidian::mcp::tools::ObsidianMCP;
use mcp_obsidian::vault::{ObsidianClient, ObsidianConfig, VaultError};

#[derive(Debug, Error)]
pub enum AppError {
    /// Obsidian client could not be created
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// Argument Error
    #[error("{reason}")]
    ArgumentError { reason: String },

    /// UnexpectedError
    #[error("{reason}")]
    UnexpectedError { reason: String },
}

impl From<TryInitError> for AppError {
    fn from(err: TryInitError) -> Self {
        AppError::unexpected_error(err.to_string())
    }
}

impl From<ServerInitializeError> for AppError {
    fn from(err: ServerInitializeError) -> Self {
        AppError::unexpected_error(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::unexpected_error(err.to_string())
    }
}

impl AppError {
    pub fn argument_error(reason: impl Into<String>) -> Self {
        AppError::ArgumentError {
            reason: reason.into(),
        }
    }

    pub fn unexpected_error(reason: impl Into<String>) -> Self {
        AppError::UnexpectedError {
            reason: reason.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct ApplicationArgs {
    #[command(flatten)]
    obsidian: ObsidianConfig,

    /// MCP Transport mode (stdio, http)
    #[arg(short, long, default_value = "http", env = "MCP_TRANSPORT_MODE")]
    transport: String,

    /// MCP HTTP server port (for http transport)
    #[arg(long, default_value = "8080", env = "MCP_HTTP_TRANSPORT_PORT")]
    port: u16,

    /// Log filter, e.g. "info" or "mcp_obsidian=debug"
    #[arg(long, default_value = "info", env = "MCP_LOG_LEVEL")]
    log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, env = "MCP_LOG_FORMAT")]
    log_format: LogFormat,
}

fn init_tracing(log_level: &str, log_format: LogFormat) -> Result<(), AppError> {
    let filter = EnvFilter::try_new(log_level)
        .map_err(|err| AppError::argument_error(format!("invalid log level '{}': {}", log_level, err)))?;

    // stdout belongs to the stdio transport
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let registry = Registry::default().with(filter);
    match log_format {
        LogFormat::Text => registry.with(layer).try_init()?,
        LogFormat::Json => registry.with(layer.json()).try_init()?,
    }

    Ok(())
}

#[cfg(feature = "stdio")]
async fn start_stdio_server(client: Arc<ObsidianClient>) -> Result<QuitReason, AppError> {
    tracing::info!("Starting MCP server in STDIO mode. Use Ctrl+C to exit.");
    let service =
        ObsidianMCP::new(client)
            .serve(stdio())
            .await
            .inspect_err(|e| { tracing::error!("serving error: {:?}", e); })?;

    service.waiting().await.map_err(|e| AppError::unexpected_error(e.to_string()))
}

#[cfg(feature = "http")]
async fn start_http_server(client: Arc<ObsidianClient>, port: u16) -> Result<QuitReason, AppError> {
    let addr = format!("0.0.0.0:{}", port);
    tracing::info!("Starting MCP server in HTTP mode with addr: {}. Use Ctrl+C to exit.", addr);

    let service = TowerToHyperService::new(
        StreamableHttpService::new(
            move || Ok(ObsidianMCP::new(client.clone())),
            LocalSessionManager::default().into(),
            Default::default(),
    ));

    let listener = tokio::net::TcpListener::bind(addr).await?;

    loop {
        let io = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            accept = listener.accept() => {
                TokioIo::new(accept?.0)
            }
        };

        let service = service.clone();
        tokio::spawn(async move {
            if let Err(err) = Builder::new(TokioExecutor::default())
                .serve_connection(io, service)
                .await
            {
                tracing::debug!("connection closed with error: {}", err);
            }
        });
    }

    tracing::info!("Ctrl+C received, stopping HTTP server");
    Ok(QuitReason::Cancelled)
}

fn handle_transport_arg_error(transport: &str) -> Result<(), AppError> {

    #[cfg(not(feature = "stdio"))]
    if transport == "stdio" {
        return Err(AppError::argument_error("STDIO transport not enabled. Rebuild with --features stdio"));
    }

    #[cfg(not(feature = "http"))]
    if transport == "http" {
        return Err(AppError::argument_error("HTTP transport not enabled. Rebuild with --features http"));
    }

    let mut enabled_transports = Vec::new();

    if cfg!(feature = "stdio") {
        enabled_transports.push("stdio");
    }

    if cfg!(feature = "http") {
        enabled_transports.push("http");
    }

    Err(AppError::argument_error(
        format!(
            "Unknown transport '{}'. Valid options: {}",
            transport,
            enabled_transports.join(","),
    )))
}

#[tokio::main]
async fn main() -> Result<(), AppError> {

    let args = ApplicationArgs::parse();

    init_tracing(&args.log_level, args.log_format)?;

    let client = Arc::new(ObsidianClient::new(&args.obsidian)?);
    tracing::info!(url = client.base_url(), "using Obsidian Local REST API");

    if let Err(err) = client.test_connection().await {
        tracing::warn!(%err, "Obsidian Local REST API is not reachable, tools will fail until it is");
    }

    match args.transport.as_str() {
        #[cfg(feature = "stdio")]
        "stdio" => {
            start_stdio_server(client).await?;
        }
        #[cfg(feature = "http")]
        "http" => {
            start_http_server(client, args.port).await?;
        }
        transport => {
            return handle_transport_arg_error(transport);
        }
    }

    Ok(())
}
