//! Subscriber registry and fanout — push events to every live connection.
//!
//! Each subscriber is an unbounded channel drained by its connection's
//! single writer task, so per-subscriber ordering is exactly emission
//! order; there is no ordering guarantee across subscribers. A subscriber
//! whose channel is gone is skipped silently and removed from the registry
//! when its connection task unregisters it — delivery never errors.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use wabridge_core::protocol::Event;

/// Identifies one registered subscriber connection.
pub type SubscriberId = u64;

/// The sending half of a subscriber's outgoing frame queue.
pub type SubscriberSender = mpsc::UnboundedSender<String>;

/// Registry of live subscriber connections.
pub struct Fanout {
    subscribers: Mutex<HashMap<SubscriberId, SubscriberSender>>,
    next_id: AtomicU64,
}

impl Fanout {
    pub fn new() -> Self {
        Fanout {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Add a subscriber; returns the id used to unregister it later.
    pub async fn register(&self, sender: SubscriberSender) -> SubscriberId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscribers.lock().await.insert(id, sender);
        debug!(subscriber = id, "subscriber registered");
        id
    }

    /// Remove a subscriber (called by its connection task on close/error).
    pub async fn unregister(&self, id: SubscriberId) {
        if self.subscribers.lock().await.remove(&id).is_some() {
            debug!(subscriber = id, "subscriber unregistered");
        }
    }

    /// Number of registered subscribers.
    pub async fn len(&self) -> usize {
        self.subscribers.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.subscribers.lock().await.is_empty()
    }

    /// Serialize `event` once and push it to every live subscriber.
    ///
    /// A closed subscriber is skipped without surfacing an error; its
    /// registry entry is cleaned up by its own connection task.
    pub async fn broadcast(&self, event: &Event) {
        let frame = match serde_json::to_string(event) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "failed to serialize event, dropping");
                return;
            }
        };

        let subscribers = self.subscribers.lock().await;
        for (id, sender) in subscribers.iter() {
            if sender.send(frame.clone()).is_err() {
                debug!(subscriber = *id, "subscriber closed, skipping delivery");
            }
        }
    }

    /// Push `event` to a single subscriber (used for direct replies).
    pub async fn send_to(&self, id: SubscriberId, event: &Event) {
        let frame = match serde_json::to_string(event) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "failed to serialize event, dropping");
                return;
            }
        };

        let subscribers = self.subscribers.lock().await;
        match subscribers.get(&id) {
            Some(sender) => {
                if sender.send(frame).is_err() {
                    debug!(subscriber = id, "subscriber closed, reply dropped");
                }
            }
            None => debug!(subscriber = id, "reply target no longer registered"),
        }
    }
}

impl Default for Fanout {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
