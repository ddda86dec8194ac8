//! Shared data types — the vocabulary spoken on both sockets.
//!
//! Wire field names are camelCase (`hasMedia`, `chatName`, `isGroup`) to
//! match what subscribers like the Home Assistant integration already parse;
//! Rust code uses snake_case via `#[serde(rename_all = "camelCase")]`.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Session lifecycle
// ─────────────────────────────────────────────

/// Lifecycle state of the chat engine session.
///
/// Exactly one current value exists process-wide, owned by the
/// [`SessionTracker`](crate::session::SessionTracker). The same enum is the
/// wire vocabulary of `status` events; `qr_pending` never appears on the
/// wire because a pending QR is published as a `qr` event instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Initializing,
    QrPending,
    Authenticated,
    Ready,
    AuthFailure,
}

// ─────────────────────────────────────────────
// Media
// ─────────────────────────────────────────────

/// Media attached to an outbound send.
///
/// The base64 payload is passed through to the engine opaque — the bridge
/// never decodes it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MediaPayload {
    /// MIME type (e.g. "image/png").
    pub mimetype: String,
    /// Base64-encoded file content.
    pub data: String,
    /// Filename shown to the recipient.
    pub filename: String,
}

// ─────────────────────────────────────────────
// Chat directory
// ─────────────────────────────────────────────

/// One row of the engine's chat directory.
///
/// Directory listings are a snapshot fetched fresh from the engine on every
/// resolution; they are never cached across calls.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatDirectoryEntry {
    /// Canonical channel id (`...@c.us` or `...@g.us`).
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// Whether this chat is a group.
    pub is_group: bool,
}

/// One row of a `groups_list` reply.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupEntry {
    pub id: String,
    pub name: String,
}

impl From<&ChatDirectoryEntry> for GroupEntry {
    fn from(entry: &ChatDirectoryEntry) -> Self {
        GroupEntry {
            id: entry.id.clone(),
            name: entry.name.clone(),
        }
    }
}

// ─────────────────────────────────────────────
// Inbound messages
// ─────────────────────────────────────────────

/// An inbound chat message as republished to subscribers.
///
/// `chat_name` / `is_group` are best-effort enrichment from a directory
/// lookup; when the lookup fails they are omitted from the JSON entirely
/// rather than serialized as null.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessageEvent {
    pub from: String,
    pub to: String,
    pub body: String,
    /// Unix timestamp (seconds) as reported by the engine.
    pub timestamp: i64,
    pub has_media: bool,
    /// Sender within a group chat; absent for direct chats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    pub is_forwarded: bool,
    pub from_me: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_group: Option<bool>,
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
