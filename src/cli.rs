//! CLI definitions for Stepwise.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Stepwise CLI.
#[derive(Parser)]
#[command(name = "stepwise")]
#[command(about = "Streaming agent session server")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the server in foreground (default)
    Run {
        /// Server host, overrides `server.host`
        #[arg(long, env = "STEPWISE_HOST")]
        host: Option<String>,

        /// Server port, overrides `server.port`
        #[arg(long, env = "STEPWISE_PORT")]
        port: Option<u16>,
    },

    /// Validate the configuration file and exit
    Check,
}
