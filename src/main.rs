//! Entra ID MCP Server
//!
//! Exposes Microsoft Graph user, group, log, device, policy and application
//! operations as MCP tools over stdio or HTTP.

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use entraid_mcp_rs::config::{env_file_candidates, load_env_file, Args, Config, LogFormat, Transport};
use entraid_mcp_rs::graph::{GraphClient, GraphSettings};
use entraid_mcp_rs::http::{self, HttpState};
use entraid_mcp_rs::mcp::handler::McpHandler;
use entraid_mcp_rs::mcp::resources::ResourceRegistry;
use entraid_mcp_rs::mcp::server::McpServer;
use entraid_mcp_rs::mcp::transport::StdioTransport;
use entraid_mcp_rs::metrics::Metrics;
use entraid_mcp_rs::service::{GroupService, UserService};
use entraid_mcp_rs::tools;
use entraid_mcp_rs::VERSION;

fn init_logging(config: &Config) {
    let default_level = if config.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str().to_lowercase()));

    // stdout belongs to the MCP channel.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match config.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn set_or_not(present: bool) -> &'static str {
    if present {
        "set"
    } else {
        "not set"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_file = load_env_file(&env_file_candidates());
    let args = Args::parse();
    let config: Config = args.into();

    init_logging(&config);

    info!("{} v{}", config.name, VERSION);
    match env_file {
        Some(path) => info!("Loaded environment from {}", path.display()),
        None => info!("No .env file found, using process environment"),
    }
    info!("Transport: {:?}", config.transport);
    info!(
        "Credentials: tenant {}, client {}, secret {}, certificate {}, certificate password {}",
        set_or_not(config.tenant_id.is_some()),
        set_or_not(config.client_id.is_some()),
        set_or_not(config.client_secret.is_some()),
        set_or_not(config.certificate_path.is_some()),
        set_or_not(config.certificate_pwd.is_some()),
    );
    if config.client_secret.is_some() && config.certificate_path.is_some() {
        warn!("Both a client secret and a certificate are configured; using the certificate");
    }

    let metrics = Metrics::new();
    let settings = GraphSettings::from_config(&config).context("Invalid configuration")?;
    let client = Arc::new(
        GraphClient::new(settings, metrics.clone()).context("Failed to create Graph client")?,
    );
    info!("Graph endpoint: {}", client.base_url());

    let mut handler = McpHandler::new(metrics.clone());
    tools::register_all_tools(&mut handler, client.clone());
    info!("Registered {} MCP tools", handler.tool_count());

    let resources = ResourceRegistry::new(
        Arc::new(UserService::new(client.clone())),
        Arc::new(GroupService::new(client)),
    )?;
    let server = Arc::new(McpServer::new(handler, config.name.clone()).with_resources(resources));

    match config.transport {
        Transport::Stdio => {
            server.run(StdioTransport::new()).await?;
        }
        Transport::Http => {
            let state = HttpState::new(server, config.metrics.then_some(metrics));
            http::start_server(&config, state).await?;
        }
    }

    Ok(())
}
