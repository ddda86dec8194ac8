//! One-shot client commands — talk to a running bridge over its socket.
//!
//! Mirrors what a controller does: connect, wait for the state snapshot,
//! issue one command, give the bridge a moment to dispatch, close. The
//! protocol has no per-command acknowledgement.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use wabridge_core::config::load_config;

/// Send one message, optionally resolving `group` by name.
pub async fn send(
    to: String,
    message: String,
    group: Option<String>,
    url: Option<String>,
) -> Result<()> {
    let mut payload = json!({
        "type": "send_message",
        "number": to,
        "message": message,
    });
    if let Some(group) = group {
        payload["group_name"] = json!(group);
    }
    issue(url, payload).await
}

/// Fan one message out to several targets.
pub async fn broadcast(targets: Vec<String>, message: String, url: Option<String>) -> Result<()> {
    if targets.is_empty() {
        bail!("broadcast needs at least one target");
    }
    issue(
        url,
        json!({
            "type": "broadcast",
            "targets": targets,
            "message": message,
        }),
    )
    .await
}

/// Resolve the bridge URL: explicit flag, else the configured listen
/// address (with the wildcard host rewritten to loopback).
fn bridge_url(url: Option<String>) -> String {
    match url {
        Some(url) => url,
        None => {
            let config = load_config(None);
            let host = if config.server.host == "0.0.0.0" {
                "127.0.0.1"
            } else {
                config.server.host.as_str()
            };
            format!("ws://{}:{}", host, config.server.port)
        }
    }
}

async fn issue(url: Option<String>, payload: serde_json::Value) -> Result<()> {
    let url = bridge_url(url);
    let (ws, _) = tokio_tungstenite::connect_async(&url)
        .await
        .with_context(|| format!("failed to connect to bridge at {url}"))?;
    let (mut write, mut read) = ws.split();

    // The first frame is always the bridge's state snapshot.
    match read.next().await {
        Some(Ok(WsMessage::Text(text))) => println!("bridge: {text}"),
        other => bail!("no snapshot from bridge: {other:?}"),
    }

    write
        .send(WsMessage::text(payload.to_string()))
        .await
        .context("failed to send command")?;

    // No ack in the protocol; give the bridge a moment to dispatch before
    // closing, the way the reference controller scripts do.
    tokio::time::sleep(Duration::from_millis(500)).await;
    let _ = write.send(WsMessage::Close(None)).await;

    println!("command sent");
    Ok(())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
