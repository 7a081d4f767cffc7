//! The chat envelope and its wire representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authorship metadata carried inside every envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}

/// The serialized chat-message object passed between layers.
///
/// Field names follow the client wire format (camelCase JSON). `created_at`
/// is assigned by the originating client/server layer and identifies the
/// moment the message was authored; the persistence consumer copies it into
/// the conversation's last-activity timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Conversation id, doubling as the fan-out room identifier.
    pub chat_id: String,
    pub body: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_edited: Option<bool>,
    pub created_by: Sender,
}

impl Envelope {
    /// Decode an envelope from the textual payload of a log record or bus
    /// frame.
    pub fn from_json(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// Encode the envelope into its wire representation.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
