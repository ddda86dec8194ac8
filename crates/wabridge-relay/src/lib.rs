//! Wabridge relay — the message routing and session-broadcast core.
//!
//! This crate connects the two sides of the bridge:
//! - **fanout**: the subscriber registry that republishes events to every
//!   connected client
//! - **dispatch**: destination resolution (names, numbers, broadcast lists)
//!   and per-target engine sends with failure isolation
//! - **inbound**: the loop consuming engine lifecycle/message events
//! - **server**: the WebSocket endpoint subscribers connect to

pub mod dispatch;
pub mod fanout;
pub mod inbound;
pub mod server;

pub use dispatch::Dispatcher;
pub use fanout::Fanout;
pub use server::{serve, BridgeState};
