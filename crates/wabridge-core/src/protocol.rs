//! Subscriber wire protocol — JSON frames exchanged with connected clients.
//!
//! Every frame in both directions is a UTF-8 JSON object with a `type`
//! discriminator. Commands are parsed as a closed tagged union: an unknown
//! `type` is a typed [`CommandError::UnknownCommand`], not a silent drop.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::{GroupEntry, InboundMessageEvent, MediaPayload, SessionState};

// ─────────────────────────────────────────────
// Commands (subscriber → bridge)
// ─────────────────────────────────────────────

/// A command received from a subscriber connection.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Send one message; `group_name` is a best-effort resolution hint.
    SendMessage {
        number: String,
        message: String,
        #[serde(default)]
        group_name: Option<String>,
        #[serde(default)]
        media: Option<MediaPayload>,
    },
    /// Send directly to a group by id, skipping name resolution.
    SendGroupMessage {
        group_id: String,
        message: String,
        #[serde(default)]
        media: Option<MediaPayload>,
    },
    /// Send the same message to each target in order.
    Broadcast {
        targets: Vec<String>,
        message: String,
        #[serde(default)]
        media: Option<MediaPayload>,
    },
    /// Request the current group directory (`groups_list` reply).
    GetGroups,
}

/// Why a subscriber frame could not be turned into a [`Command`].
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid command JSON: {0}")]
    Invalid(#[source] serde_json::Error),

    #[error("command has no `type` field")]
    MissingType,

    #[error("unknown command type `{0}`")]
    UnknownCommand(String),

    #[error("malformed `{kind}` command: {source}")]
    Malformed {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse one raw frame into a [`Command`].
///
/// The `type` field is inspected first so an unrecognized command yields
/// [`CommandError::UnknownCommand`] instead of a generic serde error.
pub fn parse_command(raw: &str) -> Result<Command, CommandError> {
    let value: Value = serde_json::from_str(raw).map_err(CommandError::Invalid)?;
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(CommandError::MissingType)?;

    match kind {
        "send_message" | "send_group_message" | "broadcast" | "get_groups" => {
            let kind = kind.to_string();
            serde_json::from_value(value).map_err(|source| CommandError::Malformed { kind, source })
        }
        other => Err(CommandError::UnknownCommand(other.to_string())),
    }
}

// ─────────────────────────────────────────────
// Events (bridge → subscribers)
// ─────────────────────────────────────────────

/// An event pushed to subscriber connections.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Session lifecycle update.
    Status { status: SessionState },
    /// A QR payload to display for pairing.
    Qr { data: String },
    /// An inbound chat message.
    Message { data: InboundMessageEvent },
    /// Reply to `get_groups` — sent to the requesting subscriber only.
    GroupsList { data: Vec<GroupEntry> },
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_send_message_minimal() {
        let cmd =
            parse_command(r#"{"type":"send_message","number":"15551234567","message":"hi"}"#)
                .unwrap();

        match cmd {
            Command::SendMessage {
                number,
                message,
                group_name,
                media,
            } => {
                assert_eq!(number, "15551234567");
                assert_eq!(message, "hi");
                assert!(group_name.is_none());
                assert!(media.is_none());
            }
            other => panic!("expected SendMessage, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_send_message_with_group_hint_and_media() {
        let raw = json!({
            "type": "send_message",
            "number": "x",
            "message": "hi",
            "group_name": "Family",
            "media": {"mimetype": "image/png", "data": "aaaa", "filename": "p.png"}
        })
        .to_string();

        let cmd = parse_command(&raw).unwrap();
        match cmd {
            Command::SendMessage {
                group_name, media, ..
            } => {
                assert_eq!(group_name.as_deref(), Some("Family"));
                assert_eq!(media.unwrap().mimetype, "image/png");
            }
            other => panic!("expected SendMessage, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_broadcast() {
        let cmd = parse_command(
            r#"{"type":"broadcast","targets":["1234567890","Test Group"],"message":"fan out"}"#,
        )
        .unwrap();

        match cmd {
            Command::Broadcast {
                targets, message, ..
            } => {
                assert_eq!(targets, vec!["1234567890", "Test Group"]);
                assert_eq!(message, "fan out");
            }
            other => panic!("expected Broadcast, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_broadcast_non_list_targets_is_malformed() {
        let err =
            parse_command(r#"{"type":"broadcast","targets":"oops","message":"x"}"#).unwrap_err();
        assert!(matches!(err, CommandError::Malformed { ref kind, .. } if kind == "broadcast"));
    }

    #[test]
    fn test_parse_send_group_message() {
        let cmd =
            parse_command(r#"{"type":"send_group_message","group_id":"123","message":"yo"}"#)
                .unwrap();
        assert!(matches!(cmd, Command::SendGroupMessage { ref group_id, .. } if group_id == "123"));
    }

    #[test]
    fn test_parse_get_groups() {
        let cmd = parse_command(r#"{"type":"get_groups"}"#).unwrap();
        assert_eq!(cmd, Command::GetGroups);
    }

    #[test]
    fn test_parse_unknown_type() {
        let err = parse_command(r#"{"type":"reboot"}"#).unwrap_err();
        assert!(matches!(err, CommandError::UnknownCommand(ref t) if t == "reboot"));
    }

    #[test]
    fn test_parse_missing_type() {
        let err = parse_command(r#"{"number":"123"}"#).unwrap_err();
        assert!(matches!(err, CommandError::MissingType));
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = parse_command("not json").unwrap_err();
        assert!(matches!(err, CommandError::Invalid(_)));
    }

    #[test]
    fn test_status_event_wire_shape() {
        let event = Event::Status {
            status: SessionState::Ready,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json, json!({"type": "status", "status": "ready"}));
    }

    #[test]
    fn test_qr_event_wire_shape() {
        let event = Event::Qr { data: "Q1".into() };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json, json!({"type": "qr", "data": "Q1"}));
    }

    #[test]
    fn test_groups_list_event_wire_shape() {
        let event = Event::GroupsList {
            data: vec![GroupEntry {
                id: "123@g.us".into(),
                name: "Family".into(),
            }],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "groups_list");
        assert_eq!(json["data"][0]["id"], "123@g.us");
        assert_eq!(json["data"][0]["name"], "Family");
    }
}
