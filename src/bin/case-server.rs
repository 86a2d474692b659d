//! case-server: accepts connections and converts one request per connection.

use case_relay::config::{Config, ServerArgs};
use case_relay::server::Server;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    let config = Config::load_server().unwrap_or_else(|e| e.exit::<ServerArgs>());

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let server = match Server::bind(&config) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "Error initializing server");
            return ExitCode::FAILURE;
        }
    };

    info!(
        "Server listening on {} | PORT: {}",
        config.options.in_address.as_deref().unwrap_or_default(),
        config.options.in_port
    );

    server.run_until(shutdown_signal()).await;
    ExitCode::SUCCESS
}

/// Resolves on Ctrl-C. If the handler cannot be installed, never resolves.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
}
