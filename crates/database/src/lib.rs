//! Persistence store adapter for the Parlor backend.
//!
//! The rest of the system treats the relational store as an external
//! collaborator with one hard requirement: an atomic unit combining a
//! message insert (with foreign keys to its conversation and author) and the
//! conversation's last-activity bump. [`MessageStore::persist_envelope`] is
//! that unit; everything else here is pool and schema plumbing.

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod store;
pub mod types;

pub use connection::prepare_database;
pub use entities::StoredMessage;
pub use store::{MessageStore, PersistOutcome};
pub use types::{StoreError, StoreResult};

use parlor_config::DatabaseConfig;
use sqlx::SqlitePool;

/// Prepare the connection pool and bring the schema up to date.
pub async fn initialize_database(config: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let pool = connection::prepare_database(config).await?;
    migrations::run_migrations(&pool).await?;
    Ok(pool)
}
