use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use console_agent_gateway::backend::ConsoleClient;
use console_agent_gateway::config::{Cli, Config};
use console_agent_gateway::server::openai_api::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "console_agent_gateway=debug,tower_http=debug"
    } else {
        "console_agent_gateway=info,tower_http=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| filter.into());

    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }

    info!("console-agent-gateway v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration.
    let config = Arc::new(Config::from_cli(&cli)?);

    let client = ConsoleClient::new(&config.backend);
    if !client.has_token() {
        warn!("ARH_JWT_TOKEN not set - backend calls will likely fail");
    }

    info!(
        backend = client.url(),
        model = %config.server.model,
        "Configuration loaded"
    );

    // Build application state.
    let state = Arc::new(AppState::new(config.clone(), Arc::new(client)));

    // Build the HTTP router.
    let app = build_router(state);

    // Start the server.
    let listen_addr = &config.server.listen;
    info!(addr = %listen_addr, "Starting server");

    let listener = TcpListener::bind(listen_addr).await?;
    info!("Listening on {listen_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
