//! Outbound dispatcher — resolve destination descriptors into engine sends.
//!
//! Destinations arrive in three shapes: raw channel ids, bare phone
//! numbers, and human-readable group names. Resolution order for one send:
//! try the group-name hint against the directory, fall back to the raw
//! identifier, normalize, deliver. Every engine failure is caught and
//! logged against its own target — nothing here ever propagates an error
//! to the subscriber connection, and one broadcast target can never take
//! down the targets after it.

use std::sync::Arc;

use tracing::{debug, error, info};

use wabridge_core::address::{normalize_group, normalize_person};
use wabridge_core::types::{GroupEntry, MediaPayload};
use wabridge_engine::ChatEngine;

/// Resolves destinations and performs sends through the engine.
pub struct Dispatcher {
    engine: Arc<dyn ChatEngine>,
}

impl Dispatcher {
    pub fn new(engine: Arc<dyn ChatEngine>) -> Self {
        Dispatcher { engine }
    }

    /// Send one message to `identifier`, optionally trying `group_hint`
    /// against the group directory first.
    ///
    /// Group-name resolution is a best-effort enhancement: a hint that does
    /// not resolve (absent, no match, or directory fetch failure) degrades
    /// to treating `identifier` as a direct destination instead of failing
    /// the operation.
    pub async fn send_one(
        &self,
        identifier: &str,
        text: &str,
        group_hint: Option<&str>,
        media: Option<&MediaPayload>,
    ) {
        let mut resolved = None;
        if let Some(hint) = group_hint {
            resolved = self.find_group_by_name(hint).await;
        }

        // Resolved ids already carry a domain marker, so normalization is
        // the identity for them; bare identifiers become person ids.
        let target = resolved.unwrap_or_else(|| identifier.to_string());
        let chat_id = normalize_person(&target);

        self.deliver(&chat_id, text, media).await;
    }

    /// Send `text` (and optional `media`) to each target, strictly in
    /// order, awaiting each send before starting the next.
    ///
    /// The same string serves as both identifier and group-name hint, so
    /// every target independently resolves as a group or falls back to a
    /// person id. Failures are isolated per target; there is no aggregated
    /// result beyond the logs.
    pub async fn broadcast(&self, targets: &[String], text: &str, media: Option<&MediaPayload>) {
        info!(targets = targets.len(), "broadcast starting");
        for target in targets {
            self.send_one(target, text, Some(target), media).await;
        }
    }

    /// Send directly to a group id, skipping name resolution.
    pub async fn send_group(&self, group_id: &str, text: &str, media: Option<&MediaPayload>) {
        let chat_id = normalize_group(group_id);
        self.deliver(&chat_id, text, media).await;
    }

    /// Current group directory rows for a `groups_list` reply.
    ///
    /// A directory fetch failure is logged and yields an empty list, so the
    /// requesting subscriber always gets a reply.
    pub async fn list_groups(&self) -> Vec<GroupEntry> {
        match self.engine.list_chats().await {
            Ok(chats) => chats
                .iter()
                .filter(|chat| chat.is_group)
                .map(GroupEntry::from)
                .collect(),
            Err(e) => {
                error!(error = %e, "failed to fetch chat directory");
                Vec::new()
            }
        }
    }

    /// Resolve a group display name to its channel id, case-insensitively.
    ///
    /// The directory is fetched fresh from the engine on every call — never
    /// cached — so a broadcast to N group-named targets costs N fetches.
    /// First match in the engine's listing order wins; chats that are not
    /// groups never match even on an exact name.
    async fn find_group_by_name(&self, name: &str) -> Option<String> {
        let chats = match self.engine.list_chats().await {
            Ok(chats) => chats,
            Err(e) => {
                error!(
                    error = %e,
                    group = %name,
                    "chat directory fetch failed, falling back to raw identifier"
                );
                return None;
            }
        };

        let wanted = name.to_lowercase();
        let found = chats
            .iter()
            .find(|chat| chat.is_group && chat.name.to_lowercase() == wanted)
            .map(|chat| chat.id.clone());

        if found.is_none() {
            debug!(group = %name, "no group with that name");
        }
        found
    }

    async fn deliver(&self, chat_id: &str, text: &str, media: Option<&MediaPayload>) {
        let result = match media {
            Some(media) => self.engine.send_media(chat_id, text, media).await,
            None => self.engine.send_text(chat_id, text).await,
        };

        match result {
            Ok(()) => info!(chat_id = %chat_id, content_len = text.len(), "message sent"),
            Err(e) => error!(chat_id = %chat_id, error = %e, "send failed"),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
