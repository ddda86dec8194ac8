//! Runner wire protocol — newline-delimited JSON on the child's stdio.
//!
//! Requests carry an `op` discriminator plus a correlation `id`; the runner
//! answers every request with a `result` frame echoing that id. Everything
//! else the runner writes is an unsolicited `event` frame. Field names are
//! camelCase to match the runner's JavaScript side.

use serde::{Deserialize, Serialize};

use wabridge_core::types::{ChatDirectoryEntry, InboundMessageEvent, MediaPayload};

/// A request written to the runner's stdin.
#[derive(Debug, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RunnerRequest {
    /// Send a plain text message.
    #[serde(rename_all = "camelCase")]
    Send { id: u64, chat_id: String, text: String },

    /// Send a media message with a caption.
    #[serde(rename_all = "camelCase")]
    SendMedia {
        id: u64,
        chat_id: String,
        caption: String,
        media: MediaPayload,
    },

    /// Fetch the full chat directory.
    ListChats { id: u64 },
}

/// A frame read from the runner's stdout.
#[derive(Debug, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunnerEvent {
    Qr {
        data: String,
    },
    Authenticated,
    Ready,
    AuthFailure {
        #[serde(default)]
        reason: String,
    },
    Message {
        data: InboundMessageEvent,
    },
    /// Reply to a request, matched by `id`.
    Result {
        id: u64,
        ok: bool,
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        chats: Option<Vec<ChatDirectoryEntry>>,
    },
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
