//! Client/server event protocol for the chat WebSocket.

use parlor_messages::Envelope;
use serde::{Deserialize, Serialize};

/// Client events received from WebSocket
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Heartbeat to keep connection alive
    Ping,
    /// Join a room; acknowledged with `joined` or `error`.
    Join { room: String },
    /// Leave a room; acknowledged with `left`.
    Leave { room: String },
    /// Publish a message to a room. Fire-and-forget: delivery failures are
    /// never surfaced back to the sender.
    Message { room: String, message: Envelope },
}

/// Server events sent to WebSocket clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Heartbeat response
    Pong,
    /// Join acknowledgement
    Joined { room: String },
    /// Leave acknowledgement
    Left { room: String },
    /// An envelope delivered to this session's room, unmodified
    Message { message: Envelope },
    /// Error acknowledgement (e.g. an invalid room on join)
    Error { code: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_events_parse_from_tagged_json() {
        let event: ClientEvent = serde_json::from_str(r#"{"type": "join", "room": "c1"}"#).unwrap();
        assert!(matches!(event, ClientEvent::Join { room } if room == "c1"));

        let event: ClientEvent = serde_json::from_str(r#"{"type": "ping"}"#).unwrap();
        assert!(matches!(event, ClientEvent::Ping));
    }

    #[test]
    fn server_events_serialize_with_type_tag() {
        let json = serde_json::to_value(ServerEvent::Joined { room: "c1".into() }).unwrap();
        assert_eq!(json["type"], "joined");
        assert_eq!(json["room"], "c1");

        let json = serde_json::to_value(ServerEvent::Error {
            code: "invalid_room".into(),
            message: "room not provided".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["code"], "invalid_room");
    }
}
