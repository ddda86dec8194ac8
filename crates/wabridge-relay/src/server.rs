//! Subscriber WebSocket server.
//!
//! One task per connection. A new subscriber receives the tracker's state
//! snapshot before anything else reaches it; commands are then processed
//! strictly in arrival order, each handled to completion before the next
//! is read. Malformed or unknown commands are logged and the connection
//! stays open. There is no authentication on this transport.

use std::sync::Arc;

use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info, warn};

use wabridge_core::protocol::{parse_command, Command, Event};
use wabridge_core::session::SessionTracker;

use crate::dispatch::Dispatcher;
use crate::fanout::{Fanout, SubscriberId};

/// Shared bridge state handed to every connection task.
pub struct BridgeState {
    pub tracker: Arc<SessionTracker>,
    pub fanout: Arc<Fanout>,
    pub dispatcher: Dispatcher,
}

/// Accept subscriber connections until the listener fails.
///
/// Takes a pre-bound listener so callers (and tests) control the address.
pub async fn serve(listener: TcpListener, state: Arc<BridgeState>) -> Result<()> {
    info!(addr = %listener.local_addr()?, "subscriber server listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, state).await {
                debug!(peer = %peer, error = %e, "subscriber connection ended");
            }
        });
    }
}

async fn handle_connection(stream: TcpStream, state: Arc<BridgeState>) -> Result<()> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    info!("new subscriber connected");

    let (mut write, mut read) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    // The snapshot goes into the queue before the subscriber joins the
    // fanout, so it is always the first frame this connection sees.
    match serde_json::to_string(&state.tracker.snapshot()) {
        Ok(frame) => {
            let _ = tx.send(frame);
        }
        Err(e) => warn!(error = %e, "failed to serialize snapshot"),
    }
    let id = state.fanout.register(tx).await;

    // Single writer task per connection keeps frames in emission order.
    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if write.send(WsMessage::text(frame)).await.is_err() {
                break;
            }
        }
    });

    // Commands are handled one at a time, in arrival order.
    while let Some(frame) = read.next().await {
        let frame = match frame {
            Ok(f) => f,
            Err(e) => {
                debug!(error = %e, "subscriber read error");
                break;
            }
        };

        match frame {
            WsMessage::Text(text) => {
                handle_frame(text.as_str(), id, &state).await;
            }
            WsMessage::Close(_) => break,
            _ => {}
        }
    }

    state.fanout.unregister(id).await;
    writer.abort();
    info!("subscriber disconnected");
    Ok(())
}

/// Parse and execute one command frame. Errors never close the connection.
async fn handle_frame(raw: &str, subscriber: SubscriberId, state: &BridgeState) {
    let command = match parse_command(raw) {
        Ok(command) => command,
        Err(e) => {
            warn!(error = %e, "rejected subscriber command");
            return;
        }
    };

    match command {
        Command::SendMessage {
            number,
            message,
            group_name,
            media,
        } => {
            state
                .dispatcher
                .send_one(&number, &message, group_name.as_deref(), media.as_ref())
                .await;
        }
        Command::SendGroupMessage {
            group_id,
            message,
            media,
        } => {
            state
                .dispatcher
                .send_group(&group_id, &message, media.as_ref())
                .await;
        }
        Command::Broadcast {
            targets,
            message,
            media,
        } => {
            if targets.is_empty() {
                error!("broadcast command with no targets");
                return;
            }
            state
                .dispatcher
                .broadcast(&targets, &message, media.as_ref())
                .await;
        }
        Command::GetGroups => {
            let groups = state.dispatcher.list_groups().await;
            state
                .fanout
                .send_to(subscriber, &Event::GroupsList { data: groups })
                .await;
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
