use abraflexi_mcp::{register_all, McpServer, ToolRegistry};
use abraflexi_sdk::AbraFlexiClient;
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;

mod config;
mod transport;

use config::{Args, ServerConfig, TransportConfig};

const DEBUG_FILTER: &str = "abraflexi_core=debug,abraflexi_sdk=debug,abraflexi_mcp=debug,abraflexi_server=debug,tower_http=debug,info";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr: stdout carries the stdio protocol
    let default_filter = if args.debug_enabled() { DEBUG_FILTER } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::info!("Starting AbraFlexi MCP server v{}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::from_args(&args).context("Invalid configuration")?;
    config.log_summary();

    let client = AbraFlexiClient::from_config(config.client.clone())
        .context("Failed to create AbraFlexi client")?;

    if args.check {
        return check_connection(&client).await;
    }

    let mut registry = ToolRegistry::new(config.gate);
    register_all(&mut registry, Arc::new(client));
    tracing::info!("Registered {} tools", registry.len());

    let server = McpServer::new(registry);
    match &config.transport {
        TransportConfig::Stdio => server.serve_stdio().await,
        TransportConfig::StreamableHttp(http) => transport::serve(server, http).await,
    }
}

/// Fetch the company descriptor to verify URL, company and credentials.
async fn check_connection(client: &AbraFlexiClient) -> Result<()> {
    let info = client
        .company()
        .info()
        .await
        .context("Connectivity check failed")?;

    tracing::info!(
        company = %info.db_name,
        name = info.name.as_deref().unwrap_or("-"),
        state = info.state.as_deref().unwrap_or("-"),
        "Connected to AbraFlexi"
    );
    Ok(())
}
