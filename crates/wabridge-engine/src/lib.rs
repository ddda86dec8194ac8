//! Wabridge engine — the seam to the external chat-automation engine.
//!
//! The routing core consumes exactly three capabilities from the engine:
//! send a text or media message to a channel id, list known chats, and emit
//! lifecycle/message events. [`ChatEngine`] is that seam. [`runner`] holds
//! the production implementation, which drives the browser-automation
//! runner as a child process. Nothing about how the engine does login,
//! encryption, or transport is modeled here.

pub mod runner;
pub mod wire;

use async_trait::async_trait;

use wabridge_core::types::{ChatDirectoryEntry, InboundMessageEvent, MediaPayload};

pub use runner::RunnerEngine;

// ─────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────

/// Lifecycle and message events emitted by the engine.
///
/// Delivered over the `mpsc` receiver handed out at spawn; the stream
/// closing means the engine is gone.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    /// A pairing QR payload was generated (opaque string).
    Qr(String),
    /// The stored session authenticated.
    Authenticated,
    /// The engine is fully connected and can send.
    Ready,
    /// Authentication failed, with the engine's reason text.
    AuthFailure(String),
    /// An inbound chat message arrived.
    Message(InboundMessageEvent),
}

// ─────────────────────────────────────────────
// ChatEngine
// ─────────────────────────────────────────────

/// The engine capabilities consumed by the routing core.
///
/// Held as `Arc<dyn ChatEngine>` by the dispatcher and the inbound relay;
/// tests substitute in-process mocks.
#[async_trait]
pub trait ChatEngine: Send + Sync {
    /// Send a plain text message to a channel id.
    async fn send_text(&self, chat_id: &str, text: &str) -> anyhow::Result<()>;

    /// Send a media message, with `caption` as the accompanying text.
    async fn send_media(
        &self,
        chat_id: &str,
        caption: &str,
        media: &MediaPayload,
    ) -> anyhow::Result<()>;

    /// List every chat the engine currently knows about.
    async fn list_chats(&self) -> anyhow::Result<Vec<ChatDirectoryEntry>>;
}
