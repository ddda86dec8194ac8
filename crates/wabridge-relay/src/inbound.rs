//! Inbound relay — engine events in, subscriber broadcasts out.
//!
//! Each handler is short and side-effect-isolated: update the tracker,
//! then hand the returned wire event to the fanout — broadcast logic never
//! re-enters the tracker. Message events get one best-effort directory
//! lookup for chat metadata before publishing.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use wabridge_core::protocol::Event;
use wabridge_core::session::SessionTracker;
use wabridge_core::types::InboundMessageEvent;
use wabridge_engine::{ChatEngine, EngineEvent};

use crate::fanout::Fanout;

/// Consume engine events until the stream closes.
///
/// The stream closing means the engine terminated; the caller treats that
/// as fatal and exits so the outer supervisor can restart the process.
pub async fn run(
    mut events: mpsc::Receiver<EngineEvent>,
    tracker: Arc<SessionTracker>,
    fanout: Arc<Fanout>,
    engine: Arc<dyn ChatEngine>,
) {
    while let Some(event) = events.recv().await {
        match event {
            EngineEvent::Qr(payload) => {
                info!("QR code received");
                let event = tracker.on_qr(payload);
                fanout.broadcast(&event).await;
            }
            EngineEvent::Authenticated => {
                let event = tracker.on_authenticated();
                fanout.broadcast(&event).await;
            }
            EngineEvent::Ready => {
                info!("engine session ready");
                let event = tracker.on_ready();
                fanout.broadcast(&event).await;
            }
            EngineEvent::AuthFailure(reason) => {
                let event = tracker.on_auth_failure(&reason);
                fanout.broadcast(&event).await;
            }
            EngineEvent::Message(message) => {
                debug!(from = %message.from, "inbound message");
                let data = enrich(engine.as_ref(), message).await;
                fanout.broadcast(&Event::Message { data }).await;
            }
        }
    }

    info!("engine event stream ended");
}

/// Attach chat metadata (`chatName`, `isGroup`) to an inbound message.
///
/// One independent directory round-trip per message. On any failure the
/// metadata fields stay absent — the relay never drops a message over
/// enrichment.
async fn enrich(engine: &dyn ChatEngine, mut message: InboundMessageEvent) -> InboundMessageEvent {
    match engine.list_chats().await {
        Ok(chats) => match chats.iter().find(|chat| chat.id == message.from) {
            Some(chat) => {
                message.chat_name = Some(chat.name.clone());
                message.is_group = Some(chat.is_group);
            }
            None => debug!(chat_id = %message.from, "message chat not in directory"),
        },
        Err(e) => warn!(error = %e, "chat metadata lookup failed, relaying without it"),
    }
    message
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use wabridge_core::types::{ChatDirectoryEntry, MediaPayload, SessionState};

    struct MockEngine {
        chats: Vec<ChatDirectoryEntry>,
        fail_directory: bool,
    }

    #[async_trait]
    impl ChatEngine for MockEngine {
        async fn send_text(&self, _chat_id: &str, _text: &str) -> anyhow::Result<()> {
            Ok(())
        }

        async fn send_media(
            &self,
            _chat_id: &str,
            _caption: &str,
            _media: &MediaPayload,
        ) -> anyhow::Result<()> {
            Ok(())
        }

        async fn list_chats(&self) -> anyhow::Result<Vec<ChatDirectoryEntry>> {
            if self.fail_directory {
                anyhow::bail!("directory unavailable");
            }
            Ok(self.chats.clone())
        }
    }

    struct Harness {
        events: mpsc::Sender<EngineEvent>,
        tracker: Arc<SessionTracker>,
        frames: mpsc::UnboundedReceiver<String>,
        relay: tokio::task::JoinHandle<()>,
    }

    async fn start(engine: MockEngine) -> Harness {
        let (event_tx, event_rx) = mpsc::channel(8);
        let tracker = Arc::new(SessionTracker::new());
        let fanout = Arc::new(Fanout::new());

        let (sub_tx, frames) = mpsc::unbounded_channel();
        fanout.register(sub_tx).await;

        let relay = tokio::spawn(run(
            event_rx,
            tracker.clone(),
            fanout,
            Arc::new(engine),
        ));

        Harness {
            events: event_tx,
            tracker,
            frames,
            relay,
        }
    }

    fn message(from: &str) -> InboundMessageEvent {
        InboundMessageEvent {
            from: from.into(),
            to: "me@c.us".into(),
            body: "hola".into(),
            timestamp: 1700000000,
            has_media: false,
            author: None,
            device_type: None,
            is_forwarded: false,
            from_me: false,
            chat_name: None,
            is_group: None,
        }
    }

    #[tokio::test]
    async fn test_qr_event_updates_tracker_and_broadcasts() {
        let mut h = start(MockEngine {
            chats: vec![],
            fail_directory: false,
        })
        .await;

        h.events.send(EngineEvent::Qr("Q1".into())).await.unwrap();

        let frame = h.frames.recv().await.unwrap();
        assert_eq!(frame, r#"{"type":"qr","data":"Q1"}"#);
        assert_eq!(h.tracker.state(), SessionState::QrPending);
    }

    #[tokio::test]
    async fn test_ready_clears_qr_and_broadcasts_status() {
        let mut h = start(MockEngine {
            chats: vec![],
            fail_directory: false,
        })
        .await;

        h.events.send(EngineEvent::Qr("Q1".into())).await.unwrap();
        h.events.send(EngineEvent::Ready).await.unwrap();

        let _qr = h.frames.recv().await.unwrap();
        let status = h.frames.recv().await.unwrap();
        assert_eq!(status, r#"{"type":"status","status":"ready"}"#);
        assert!(h.tracker.qr().is_none());
    }

    #[tokio::test]
    async fn test_authenticated_broadcast_is_informational() {
        let mut h = start(MockEngine {
            chats: vec![],
            fail_directory: false,
        })
        .await;

        h.events.send(EngineEvent::Authenticated).await.unwrap();

        let frame = h.frames.recv().await.unwrap();
        assert_eq!(frame, r#"{"type":"status","status":"authenticated"}"#);
        // State is untouched by the informational event.
        assert_eq!(h.tracker.state(), SessionState::Initializing);
    }

    #[tokio::test]
    async fn test_auth_failure_broadcasts_status() {
        let mut h = start(MockEngine {
            chats: vec![],
            fail_directory: false,
        })
        .await;

        h.events
            .send(EngineEvent::AuthFailure("expired".into()))
            .await
            .unwrap();

        let frame = h.frames.recv().await.unwrap();
        assert_eq!(frame, r#"{"type":"status","status":"auth_failure"}"#);
    }

    #[tokio::test]
    async fn test_message_is_enriched_with_chat_metadata() {
        let mut h = start(MockEngine {
            chats: vec![ChatDirectoryEntry {
                id: "123@g.us".into(),
                name: "Family".into(),
                is_group: true,
            }],
            fail_directory: false,
        })
        .await;

        h.events
            .send(EngineEvent::Message(message("123@g.us")))
            .await
            .unwrap();

        let frame = h.frames.recv().await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(json["type"], "message");
        assert_eq!(json["data"]["chatName"], "Family");
        assert_eq!(json["data"]["isGroup"], true);
    }

    #[tokio::test]
    async fn test_enrichment_failure_omits_metadata() {
        let mut h = start(MockEngine {
            chats: vec![],
            fail_directory: true,
        })
        .await;

        h.events
            .send(EngineEvent::Message(message("555@c.us")))
            .await
            .unwrap();

        let frame = h.frames.recv().await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&frame).unwrap();
        // Relayed anyway, with the metadata keys absent entirely.
        assert_eq!(json["data"]["body"], "hola");
        assert!(json["data"].get("chatName").is_none());
        assert!(json["data"].get("isGroup").is_none());
    }

    #[tokio::test]
    async fn test_unknown_chat_omits_metadata() {
        let mut h = start(MockEngine {
            chats: vec![ChatDirectoryEntry {
                id: "other@c.us".into(),
                name: "Ana".into(),
                is_group: false,
            }],
            fail_directory: false,
        })
        .await;

        h.events
            .send(EngineEvent::Message(message("555@c.us")))
            .await
            .unwrap();

        let frame = h.frames.recv().await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert!(json["data"].get("chatName").is_none());
    }

    #[tokio::test]
    async fn test_relay_ends_when_event_stream_closes() {
        let h = start(MockEngine {
            chats: vec![],
            fail_directory: false,
        })
        .await;

        drop(h.events);
        h.relay.await.unwrap();
    }
}
