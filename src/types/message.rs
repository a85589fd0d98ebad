use serde::{Deserialize, Serialize};

use crate::messaging::EventKind;
use crate::types::constants::message_types;

/// Outbound envelope sent over the push channel.
///
/// The wire format is a JSON object tagged by `type`:
/// `{"type":"subscribe","topic":"scan:42"}`, `{"type":"ping"}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Subscribe { topic: String },
    Unsubscribe { topic: String },
    Ping,
}

impl ClientMessage {
    pub fn subscribe(topic: impl Into<String>) -> Self {
        Self::Subscribe {
            topic: topic.into(),
        }
    }

    pub fn unsubscribe(topic: impl Into<String>) -> Self {
        Self::Unsubscribe {
            topic: topic.into(),
        }
    }
}

/// Inbound envelope as read off the wire.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// Heartbeat acknowledgment; consumed by the client, never forwarded.
    Pong,
    /// A server-pushed event delivered to listeners registered for `kind`.
    Event {
        kind: EventKind,
        data: serde_json::Value,
    },
}

impl ServerMessage {
    /// Decodes a raw text frame. The caller logs and drops malformed frames.
    pub fn parse(raw: &str) -> crate::types::Result<Self> {
        let envelope: Envelope = serde_json::from_str(raw)?;
        if envelope.kind == message_types::PONG {
            return Ok(Self::Pong);
        }
        Ok(Self::Event {
            kind: EventKind::parse(&envelope.kind),
            data: envelope.data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_serialization() {
        let message = ClientMessage::subscribe("scan:42");
        let json = serde_json::to_string(&message).unwrap();
        assert_eq!(json, r#"{"type":"subscribe","topic":"scan:42"}"#);
    }

    #[test]
    fn test_unsubscribe_serialization() {
        let message = ClientMessage::unsubscribe("scan:42");
        let json = serde_json::to_string(&message).unwrap();
        assert_eq!(json, r#"{"type":"unsubscribe","topic":"scan:42"}"#);
    }

    #[test]
    fn test_ping_serialization() {
        let json = serde_json::to_string(&ClientMessage::Ping).unwrap();
        assert_eq!(json, r#"{"type":"ping"}"#);
    }

    #[test]
    fn test_parse_pong() {
        let message = ServerMessage::parse(r#"{"type":"pong"}"#).unwrap();
        assert_eq!(message, ServerMessage::Pong);
    }

    #[test]
    fn test_parse_event_with_data() {
        let message =
            ServerMessage::parse(r#"{"type":"notification","data":{"id":7}}"#).unwrap();
        assert_eq!(
            message,
            ServerMessage::Event {
                kind: EventKind::Notification,
                data: serde_json::json!({"id": 7}),
            }
        );
    }

    #[test]
    fn test_parse_event_without_data_defaults_to_null() {
        let message = ServerMessage::parse(r#"{"type":"scan_progress"}"#).unwrap();
        assert_eq!(
            message,
            ServerMessage::Event {
                kind: EventKind::ScanProgress,
                data: serde_json::Value::Null,
            }
        );
    }

    #[test]
    fn test_parse_malformed_frame_is_an_error() {
        assert!(ServerMessage::parse("not json").is_err());
        assert!(ServerMessage::parse(r#"{"data":{}}"#).is_err());
    }
}
