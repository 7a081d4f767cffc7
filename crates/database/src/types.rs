//! Error types for the persistence store.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures of the envelope persistence transaction.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced conversation or author does not exist (yet). This is
    /// the transient failure that drives the consumer's backpressure pause.
    #[error("referenced conversation or author does not exist: {0}")]
    MissingReference(String),

    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    /// Classify a sqlx failure from the persist transaction.
    pub(crate) fn from_sqlx(error: sqlx::Error) -> Self {
        if let Some(db_error) = error.as_database_error() {
            if db_error.message().contains("FOREIGN KEY constraint failed") {
                return StoreError::MissingReference(db_error.message().to_string());
            }
        }
        StoreError::Database(error.to_string())
    }
}
