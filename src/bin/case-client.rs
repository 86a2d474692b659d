//! case-client: sends one conversion request and prints the reply.

use case_relay::client;
use case_relay::config::{ClientArgs, Config};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::load_client().unwrap_or_else(|e| e.exit::<ClientArgs>());

    // Logs go to stderr; stdout only carries the exchange.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    println!(
        "Message sent to server: {}|{}",
        config.options.conversion,
        config.options.message.as_deref().unwrap_or_default()
    );

    match client::run(&config).await {
        Ok(response) => {
            if !response.is_empty() {
                println!(
                    "Message received from server: {}",
                    String::from_utf8_lossy(&response)
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Exchange failed");
            ExitCode::FAILURE
        }
    }
}
