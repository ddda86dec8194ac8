//! Wabridge CLI — entry point.
//!
//! # Commands
//!
//! - `wabridge serve` — run the bridge (engine runner + subscriber server)
//! - `wabridge status` — show configuration
//! - `wabridge init` — write a default config file
//! - `wabridge send` / `wabridge broadcast` — one-shot clients for a
//!   running bridge

mod helpers;
mod init_cmd;
mod send_cmd;
mod serve;
mod status;

use anyhow::Result;
use clap::{Parser, Subcommand};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// WhatsApp automation bridge for home-automation controllers
#[derive(Parser)]
#[command(name = "wabridge", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bridge (engine runner + subscriber WebSocket server)
    Serve {
        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Show configuration and session status
    Status,

    /// Write a default config file
    Init,

    /// Send one message through a running bridge
    Send {
        /// Destination: phone number or full channel id
        #[arg(short, long)]
        to: String,

        /// Message text
        #[arg(short, long)]
        message: String,

        /// Group name to resolve instead of sending to `to` directly
        #[arg(short, long)]
        group: Option<String>,

        /// Bridge WebSocket URL (defaults to the configured listen address)
        #[arg(long)]
        url: Option<String>,
    },

    /// Fan one message out to several targets through a running bridge
    Broadcast {
        /// Targets: phone numbers, channel ids, or group names
        targets: Vec<String>,

        /// Message text
        #[arg(short, long)]
        message: String,

        /// Bridge WebSocket URL (defaults to the configured listen address)
        #[arg(long)]
        url: Option<String>,
    },
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { logs } => {
            init_logging(logs);
            serve::run().await
        }
        Commands::Status => status::run(),
        Commands::Init => init_cmd::run(),
        Commands::Send {
            to,
            message,
            group,
            url,
        } => {
            init_logging(false);
            send_cmd::send(to, message, group, url).await
        }
        Commands::Broadcast {
            targets,
            message,
            url,
        } => {
            init_logging(false);
            send_cmd::broadcast(targets, message, url).await
        }
    }
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("wabridge=debug,info")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
