mod command;
mod config;
mod transport;

use command::{CommandRunner, SystemLauncher, UpdateHandler};
use config::ServerConfig;
use std::sync::Arc;
use transport::HttpServer;

use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = ServerConfig::default();

    let runner = CommandRunner::new(Arc::new(SystemLauncher), config.retry);
    let handler = UpdateHandler::new(config.commands, runner);

    info!("Salt update hook starting");
    for command in handler.commands() {
        info!("  command: {}", command);
    }
    info!(
        "  retry: {} attempts, {:?} apart",
        config.retry.max_attempts(),
        config.retry.delay()
    );

    let server = HttpServer::bind(&config.bind_addr, handler).await?;

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
}
