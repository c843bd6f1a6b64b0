//! Provider gateway entry point.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use provider_gateway::api::Server;
use provider_gateway::config::Config;
use provider_gateway::manager::{ConfigManager, SystemConfig};
use provider_gateway::registry::{Registry, StaticProvider};
use provider_gateway::utils::shutdown_signal;
use provider_gateway::GatewayError;

/// HTTP gateway exposing health, provider listing, and status endpoints.
#[derive(Parser, Debug)]
#[command(name = "provider-gateway")]
#[command(about = "HTTP API over the provider registry and system configuration")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default).
    Run {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter = if args.verbose || config.verbose {
        EnvFilter::new("provider_gateway=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.rust_log))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(&config),
        Some(Command::Run { port }) => cmd_run(config, port).await,
        None => cmd_run(config, None).await,
    }
}

/// Check configuration validity.
fn cmd_check_config(config: &Config) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("PROVIDER GATEWAY - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Validating configuration... ");
    if let Err(e) = config.validate() {
        println!("FAILED");
        println!("  Error: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed"));
    }
    println!("OK");

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Listen: {}:{}", config.host, config.port);
    println!("  Shutdown Timeout: {}s", config.shutdown_timeout_secs);
    println!("  Version: {}", config.app_version);
    if config.providers.is_empty() {
        println!("  Providers: (none)");
    } else {
        println!("  Providers: {}", config.providers.join(", "));
    }
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Build the server from validated configuration.
fn build_server(config: &Config, port: Option<u16>) -> provider_gateway::Result<Server> {
    config.validate().map_err(GatewayError::InvalidConfig)?;

    let registry = Arc::new(Registry::new());
    for name in &config.providers {
        registry.register(Arc::new(StaticProvider::new(name.as_str())))?;
    }

    let config_manager = Arc::new(ConfigManager::new(SystemConfig::new(
        config.app_version.as_str(),
    )));

    info!(
        version = %config.app_version,
        providers = registry.len(),
        "Starting provider gateway"
    );

    let server = Server::new(
        registry,
        config_manager,
        port.unwrap_or(config.port),
        config.shutdown_timeout(),
    )
    .with_host(config.host);

    Ok(server)
}

/// Serve the HTTP API until Ctrl+C or SIGTERM.
async fn cmd_run(config: Config, port: Option<u16>) -> anyhow::Result<()> {
    let server = build_server(&config, port)?;
    server.start().await?;

    shutdown_signal().await;

    if let Err(e) = server.stop().await {
        error!(error = %e, "Graceful shutdown failed");
        return Err(e.into());
    }

    info!("Shutdown complete");
    Ok(())
}
