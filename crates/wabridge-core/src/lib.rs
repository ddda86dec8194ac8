//! Wabridge core — wire protocol types, session state tracking, destination
//! normalization, and configuration shared by every crate in the workspace.

pub mod address;
pub mod config;
pub mod protocol;
pub mod session;
pub mod types;
pub mod utils;

pub use protocol::{Command, CommandError, Event};
pub use session::SessionTracker;
pub use types::{ChatDirectoryEntry, GroupEntry, InboundMessageEvent, MediaPayload, SessionState};
