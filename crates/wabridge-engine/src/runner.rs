//! Production engine — drives the browser-automation runner child process.
//!
//! The runner (a Node.js process embedding the vendored WhatsApp Web
//! client) is spawned with piped stdio and speaks the [`wire`](crate::wire)
//! protocol as newline-delimited JSON. Failing to spawn it is the bridge's
//! one fatal condition: the caller exits non-zero and the outer supervisor
//! restarts the whole process, clearing any stale session lock on disk.
//! There is no in-process retry.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, error, info, warn};

use wabridge_core::config::EngineConfig;
use wabridge_core::types::{ChatDirectoryEntry, MediaPayload};
use wabridge_core::utils::expand_home;

use crate::wire::{RunnerEvent, RunnerRequest};
use crate::{ChatEngine, EngineEvent};

/// Capacity of the engine event channel.
const EVENT_BUFFER: usize = 64;

/// A resolved `result` frame.
struct Reply {
    ok: bool,
    error: Option<String>,
    chats: Option<Vec<ChatDirectoryEntry>>,
}

/// Requests awaiting a `result` frame.
///
/// `closed` flips once the runner's stdout ends; it lives under the same
/// lock as the map so a request can never be registered after the pump has
/// already failed the in-flight ones.
struct PendingState {
    closed: bool,
    waiting: HashMap<u64, oneshot::Sender<Reply>>,
}

type PendingMap = Arc<Mutex<PendingState>>;

// ─────────────────────────────────────────────
// RunnerEngine
// ─────────────────────────────────────────────

/// [`ChatEngine`] implementation backed by the runner child process.
pub struct RunnerEngine {
    stdin: Mutex<ChildStdin>,
    pending: PendingMap,
    next_id: AtomicU64,
    /// Held so the runner is killed when the bridge exits.
    _child: Child,
}

impl RunnerEngine {
    /// Spawn the runner and return the engine plus its event stream.
    ///
    /// The receiver yields lifecycle and message events until the runner
    /// terminates; the stream closing is how callers learn the engine died.
    pub async fn spawn(
        config: &EngineConfig,
    ) -> Result<(Arc<Self>, mpsc::Receiver<EngineEvent>)> {
        let data_path = expand_home(&config.data_path);
        std::fs::create_dir_all(&data_path)
            .with_context(|| format!("failed to create session dir {}", data_path.display()))?;

        info!(command = %config.command, args = ?config.args, "starting engine runner");

        let mut child = Command::new(&config.command)
            .args(&config.args)
            .env("WA_DATA_PATH", &data_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn engine runner `{}`", config.command))?;

        let stdin = child.stdin.take().context("runner missing stdin pipe")?;
        let stdout = child.stdout.take().context("runner missing stdout pipe")?;
        let stderr = child.stderr.take().context("runner missing stderr pipe")?;

        let pending: PendingMap = Arc::new(Mutex::new(PendingState {
            closed: false,
            waiting: HashMap::new(),
        }));
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);

        tokio::spawn(pump_events(stdout, pending.clone(), event_tx));
        tokio::spawn(pump_stderr(stderr));

        let engine = Arc::new(RunnerEngine {
            stdin: Mutex::new(stdin),
            pending,
            next_id: AtomicU64::new(1),
            _child: child,
        });

        Ok((engine, event_rx))
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Write one request frame and await its `result`.
    async fn request(&self, request_id: u64, request: &RunnerRequest) -> Result<Reply> {
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            if pending.closed {
                return Err(anyhow!("runner is not running"));
            }
            pending.waiting.insert(request_id, tx);
        }

        if let Err(e) = self.write_frame(request).await {
            self.pending.lock().await.waiting.remove(&request_id);
            return Err(e);
        }

        let reply = rx
            .await
            .map_err(|_| anyhow!("runner closed before replying to request {request_id}"))?;

        if reply.ok {
            Ok(reply)
        } else {
            Err(anyhow!(reply
                .error
                .unwrap_or_else(|| "runner reported an unspecified error".to_string())))
        }
    }

    async fn write_frame(&self, request: &RunnerRequest) -> Result<()> {
        let frame = serde_json::to_string(request).context("failed to encode runner frame")?;
        let mut stdin = self.stdin.lock().await;
        stdin
            .write_all(frame.as_bytes())
            .await
            .context("failed writing frame to runner")?;
        stdin
            .write_all(b"\n")
            .await
            .context("failed writing frame delimiter to runner")?;
        stdin.flush().await.context("failed flushing runner stdin")?;
        Ok(())
    }
}

#[async_trait]
impl ChatEngine for RunnerEngine {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<()> {
        let id = self.next_id();
        self.request(
            id,
            &RunnerRequest::Send {
                id,
                chat_id: chat_id.to_string(),
                text: text.to_string(),
            },
        )
        .await?;
        Ok(())
    }

    async fn send_media(&self, chat_id: &str, caption: &str, media: &MediaPayload) -> Result<()> {
        let id = self.next_id();
        self.request(
            id,
            &RunnerRequest::SendMedia {
                id,
                chat_id: chat_id.to_string(),
                caption: caption.to_string(),
                media: media.clone(),
            },
        )
        .await?;
        Ok(())
    }

    async fn list_chats(&self) -> Result<Vec<ChatDirectoryEntry>> {
        let id = self.next_id();
        let reply = self.request(id, &RunnerRequest::ListChats { id }).await?;
        Ok(reply.chats.unwrap_or_default())
    }
}

// ─────────────────────────────────────────────
// Pump tasks
// ─────────────────────────────────────────────

/// Read runner stdout: resolve `result` frames, forward everything else.
async fn pump_events(
    stdout: ChildStdout,
    pending: PendingMap,
    events: mpsc::Sender<EngineEvent>,
) {
    let mut lines = BufReader::new(stdout).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }

        let parsed: RunnerEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "unparsable runner frame, dropping");
                continue;
            }
        };

        match parsed {
            RunnerEvent::Result { id, ok, error, chats } => {
                match pending.lock().await.waiting.remove(&id) {
                    Some(tx) => {
                        let _ = tx.send(Reply { ok, error, chats });
                    }
                    None => warn!(id, "runner result for unknown request"),
                }
            }
            RunnerEvent::Qr { data } => forward(&events, EngineEvent::Qr(data)).await,
            RunnerEvent::Authenticated => forward(&events, EngineEvent::Authenticated).await,
            RunnerEvent::Ready => forward(&events, EngineEvent::Ready).await,
            RunnerEvent::AuthFailure { reason } => {
                forward(&events, EngineEvent::AuthFailure(reason)).await
            }
            RunnerEvent::Message { data } => forward(&events, EngineEvent::Message(data)).await,
        }
    }

    // Stdout closed: the runner is gone. Fail whatever is still in flight;
    // dropping `events` ends the inbound relay, which shuts the bridge down.
    error!("engine runner stdout closed");
    let mut pending = pending.lock().await;
    pending.closed = true;
    pending.waiting.clear();
}

async fn forward(events: &mpsc::Sender<EngineEvent>, event: EngineEvent) {
    if events.send(event).await.is_err() {
        debug!("engine event receiver dropped");
    }
}

/// Forward the runner's own log lines into the bridge's log stream.
async fn pump_stderr(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if !line.trim().is_empty() {
            debug!(line = %line, "runner stderr");
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
