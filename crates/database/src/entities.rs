//! Row types read back from the store.

/// A persisted message row.
#[derive(Debug, Clone)]
pub struct StoredMessage {
    pub id: i64,
    pub public_id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub body: Option<String>,
    pub image: Option<String>,
    pub is_edited: bool,
    pub created_at: String,
    pub updated_at: String,
}
