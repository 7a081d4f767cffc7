//! The `{roomId, data}` payload carried on the fan-out channel.

use parlor_messages::Envelope;
use serde::{Deserialize, Serialize};

use crate::error::BusError;

/// One fan-out record: which room, which envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusFrame {
    pub room_id: String,
    pub data: Envelope,
}

impl BusFrame {
    pub fn new(room_id: impl Into<String>, data: Envelope) -> Self {
        Self {
            room_id: room_id.into(),
            data,
        }
    }

    pub fn encode(&self) -> Result<String, BusError> {
        serde_json::to_string(self).map_err(BusError::Codec)
    }

    pub fn decode(payload: &str) -> Result<Self, BusError> {
        serde_json::from_str(payload).map_err(BusError::Codec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use parlor_messages::Sender;

    fn envelope() -> Envelope {
        let at = Utc.with_ymd_and_hms(2024, 5, 2, 9, 30, 0).unwrap();
        Envelope {
            chat_id: "c1".into(),
            body: Some("hi".into()),
            image: None,
            created_at: at,
            updated_at: at,
            public_id: None,
            is_edited: None,
            created_by: Sender {
                id: "u1".into(),
                name: "Ada".into(),
                email: "ada@example.com".into(),
                image: None,
            },
        }
    }

    #[test]
    fn round_trips_room_and_envelope_exactly() {
        let frame = BusFrame::new("c1", envelope());
        let decoded = BusFrame::decode(&frame.encode().unwrap()).unwrap();
        assert_eq!(decoded, frame);
        assert_eq!(decoded.room_id, "c1");
        assert_eq!(decoded.data, envelope());
    }

    #[test]
    fn wire_format_matches_channel_contract() {
        let frame = BusFrame::new("c1", envelope());
        let value: serde_json::Value = serde_json::from_str(&frame.encode().unwrap()).unwrap();
        assert_eq!(value["roomId"], "c1");
        assert_eq!(value["data"]["chatId"], "c1");
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert!(BusFrame::decode("not json").is_err());
        assert!(BusFrame::decode(r#"{"roomId": "c1"}"#).is_err());
    }
}
