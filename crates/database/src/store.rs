//! The atomic envelope persistence transaction.

use chrono::{DateTime, Utc};
use parlor_messages::Envelope;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::entities::StoredMessage;
use crate::types::{StoreError, StoreResult};

/// Outcome of a persist attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The message row was inserted and the conversation touched.
    Stored,
    /// A row with the same public id already exists; nothing was written.
    /// Expected under at-least-once redelivery from the durable log.
    Duplicate,
}

/// Store for durable message writes, shared by reference across the process.
#[derive(Clone)]
pub struct MessageStore {
    pool: SqlitePool,
}

impl MessageStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Persist one envelope as a single transaction: insert the message row
    /// (foreign keys to its conversation and author) and move the
    /// conversation's last-activity timestamp to the envelope's creation
    /// time. A missing conversation or author fails the whole unit with
    /// [`StoreError::MissingReference`] and leaves no partial writes behind.
    pub async fn persist_envelope(&self, envelope: &Envelope) -> StoreResult<PersistOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(StoreError::from_sqlx)?;

        if let Some(public_id) = &envelope.public_id {
            let exists: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE public_id = ?")
                    .bind(public_id)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(StoreError::from_sqlx)?;

            if exists > 0 {
                debug!(public_id = %public_id, "envelope already persisted, skipping");
                return Ok(PersistOutcome::Duplicate);
            }
        }

        let public_id = envelope
            .public_id
            .clone()
            .unwrap_or_else(cuid2::create_id);

        let insert = sqlx::query(
            "INSERT INTO messages (public_id, conversation_id, sender_id, body, image, is_edited, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(&envelope.chat_id)
        .bind(&envelope.created_by.id)
        .bind(&envelope.body)
        .bind(&envelope.image)
        .bind(envelope.is_edited.unwrap_or(false))
        .bind(rfc3339(&envelope.created_at))
        .bind(rfc3339(&envelope.updated_at))
        .execute(&mut *tx)
        .await;

        if let Err(error) = insert {
            if is_duplicate_public_id(&error) {
                // Lost a race against a concurrent consumer; the row exists.
                debug!(public_id = %public_id, "concurrent insert won, treating as duplicate");
                return Ok(PersistOutcome::Duplicate);
            }
            return Err(StoreError::from_sqlx(error));
        }

        sqlx::query("UPDATE conversations SET last_message_at = ? WHERE id = ?")
            .bind(rfc3339(&envelope.created_at))
            .bind(&envelope.chat_id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from_sqlx)?;

        tx.commit().await.map_err(StoreError::from_sqlx)?;

        info!(
            public_id = %public_id,
            conversation_id = %envelope.chat_id,
            sender_id = %envelope.created_by.id,
            "message persisted"
        );

        Ok(PersistOutcome::Stored)
    }

    /// Fetch a persisted message by its public id.
    pub async fn find_by_public_id(&self, public_id: &str) -> StoreResult<Option<StoredMessage>> {
        let row = sqlx::query(
            "SELECT id, public_id, conversation_id, sender_id, body, image, is_edited, created_at, updated_at
             FROM messages WHERE public_id = ?",
        )
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(StoredMessage {
            id: row.try_get("id").map_err(StoreError::from_sqlx)?,
            public_id: row.try_get("public_id").map_err(StoreError::from_sqlx)?,
            conversation_id: row
                .try_get("conversation_id")
                .map_err(StoreError::from_sqlx)?,
            sender_id: row.try_get("sender_id").map_err(StoreError::from_sqlx)?,
            body: row.try_get("body").map_err(StoreError::from_sqlx)?,
            image: row.try_get("image").map_err(StoreError::from_sqlx)?,
            is_edited: row.try_get("is_edited").map_err(StoreError::from_sqlx)?,
            created_at: row.try_get("created_at").map_err(StoreError::from_sqlx)?,
            updated_at: row.try_get("updated_at").map_err(StoreError::from_sqlx)?,
        }))
    }
}

fn rfc3339(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339()
}

fn is_duplicate_public_id(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .map(|db| db.message().contains("UNIQUE constraint failed: messages.public_id"))
        .unwrap_or(false)
}
