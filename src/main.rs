//! Stepwise - streaming agent session server
//!
//! Main entry point for the Stepwise CLI and server.

mod cli;
mod register;
mod server;

use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use server::{check_config, init_tracing, load_config, run_server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = load_config(&cli.config)?;
    init_tracing(&config.logging)?;
    info!("Configuration: {}", cli.config.display());

    match cli.command {
        None => run_server(config).await,
        Some(Commands::Run { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            run_server(config).await
        }
        Some(Commands::Check) => {
            check_config(&config)?;
            println!("Configuration OK");
            Ok(())
        }
    }
}
