//! Session state tracker — the engine's current lifecycle state and last QR.
//!
//! Pure state, no I/O. Transitions are driven by engine lifecycle events;
//! each transition method returns the wire event the caller should push
//! through the fanout, so broadcast logic never re-enters the tracker.
//! Transitions are last-write-wins and never rejected — the engine is
//! trusted to emit a sane sequence.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::protocol::Event;
use crate::types::SessionState;

struct Inner {
    state: SessionState,
    qr: Option<String>,
    changed_at: DateTime<Utc>,
}

/// Tracks the current session state and the last QR payload.
///
/// Shared by `Arc` between the inbound relay (writer) and the subscriber
/// server (snapshot reader); a plain mutex serializes access, and no lock
/// is ever held across an await point.
pub struct SessionTracker {
    inner: Mutex<Inner>,
}

impl SessionTracker {
    pub fn new() -> Self {
        SessionTracker {
            inner: Mutex::new(Inner {
                state: SessionState::Initializing,
                qr: None,
                changed_at: Utc::now(),
            }),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.inner.lock().unwrap().state
    }

    /// Last QR payload, if one is pending.
    pub fn qr(&self) -> Option<String> {
        self.inner.lock().unwrap().qr.clone()
    }

    /// A fresh QR payload arrived: store it and enter `qr_pending`.
    pub fn on_qr(&self, payload: impl Into<String>) -> Event {
        let payload = payload.into();
        {
            let mut inner = self.inner.lock().unwrap();
            Self::transition(&mut inner, SessionState::QrPending);
            inner.qr = Some(payload.clone());
        }
        Event::Qr { data: payload }
    }

    /// The engine authenticated.
    ///
    /// Informational only: the stored state is left alone so a subscriber
    /// that connects between `authenticated` and `ready` still receives the
    /// pending QR snapshot.
    pub fn on_authenticated(&self) -> Event {
        debug!("session authenticated");
        Event::Status {
            status: SessionState::Authenticated,
        }
    }

    /// The engine is ready: clear the stored QR.
    pub fn on_ready(&self) -> Event {
        let mut inner = self.inner.lock().unwrap();
        Self::transition(&mut inner, SessionState::Ready);
        inner.qr = None;
        Event::Status {
            status: SessionState::Ready,
        }
    }

    /// Authentication failed.
    pub fn on_auth_failure(&self, reason: &str) -> Event {
        warn!(reason = %reason, "session authentication failure");
        let mut inner = self.inner.lock().unwrap();
        Self::transition(&mut inner, SessionState::AuthFailure);
        Event::Status {
            status: SessionState::AuthFailure,
        }
    }

    /// The event a brand-new subscriber receives before anything else.
    ///
    /// Always computed from the current state — never cached — so a
    /// reconnecting subscriber sees whatever is true right now.
    pub fn snapshot(&self) -> Event {
        let inner = self.inner.lock().unwrap();
        match (inner.state, &inner.qr) {
            (SessionState::Ready, _) => Event::Status {
                status: SessionState::Ready,
            },
            (SessionState::QrPending, Some(qr)) => Event::Qr { data: qr.clone() },
            _ => Event::Status {
                status: SessionState::Initializing,
            },
        }
    }

    fn transition(inner: &mut Inner, next: SessionState) {
        let now = Utc::now();
        let held = (now - inner.changed_at).num_seconds();
        debug!(from = ?inner.state, to = ?next, held_secs = held, "session transition");
        inner.state = next;
        inner.changed_at = now;
    }
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
