//! `wabridge serve` — run the bridge.
//!
//! Startup sequence:
//! 1. Load config
//! 2. Spawn the engine runner — the one fatal step: on failure the process
//!    exits non-zero so the external supervisor restarts it and clears any
//!    stale session lock on disk (no in-process retry)
//! 3. Bind the subscriber WebSocket server
//! 4. Run accept loop + inbound relay until either finishes or Ctrl+C

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::net::TcpListener;
use tracing::{error, info};

use wabridge_core::config::load_config;
use wabridge_core::session::SessionTracker;
use wabridge_engine::RunnerEngine;
use wabridge_relay::server::BridgeState;
use wabridge_relay::{inbound, server, Dispatcher, Fanout};

use crate::helpers;

/// Run the bridge until shutdown.
pub async fn run() -> Result<()> {
    println!();
    helpers::print_banner();
    println!();

    let config = load_config(None);

    // Engine first: with no runner there is nothing to serve.
    let (engine, events) = RunnerEngine::spawn(&config.engine)
        .await
        .context("failed to initialize chat engine")?;

    let tracker = Arc::new(SessionTracker::new());
    let fanout = Arc::new(Fanout::new());
    let state = Arc::new(BridgeState {
        tracker: tracker.clone(),
        fanout: fanout.clone(),
        dispatcher: Dispatcher::new(engine.clone()),
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    println!("  Listening: ws://{addr}");
    println!(
        "  Engine:    {} {}",
        config.engine.command,
        config.engine.args.join(" ")
    );
    println!();
    println!("  Ctrl+C to stop");
    println!();

    info!(addr = %addr, "bridge starting");

    tokio::select! {
        result = server::serve(listener, state) => {
            if let Err(e) = result {
                error!(error = %e, "subscriber server error");
            }
            bail!("subscriber server terminated");
        }
        _ = inbound::run(events, tracker, fanout, engine) => {
            // The event stream only ends when the runner dies.
            error!("engine terminated, exiting for supervisor restart");
            bail!("chat engine terminated");
        }
        _ = tokio::signal::ctrl_c() => {
            println!();
            println!("  Shutting down...");
            info!("received Ctrl+C, shutting down");
        }
    }

    println!("  Bridge stopped. Goodbye!");
    Ok(())
}
