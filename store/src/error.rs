//! Unified error handling for the store.

use shelf_engine::SyncError;

/// Storage error type.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed {column} in row {row_id}: {reason}")]
    MalformedRow {
        row_id: String,
        column: &'static str,
        reason: String,
    },

    #[error("Invalid cover path: {0}")]
    InvalidCoverPath(String),
}

impl StoreError {
    pub(crate) fn malformed(row_id: &str, column: &'static str, reason: impl ToString) -> Self {
        StoreError::MalformedRow {
            row_id: row_id.to_string(),
            column,
            reason: reason.to_string(),
        }
    }

    /// Convert into the engine's boundary error, tagged with the store call
    /// that failed.
    pub fn into_sync(self, context: &str) -> SyncError {
        match &self {
            StoreError::Database(e) => tracing::error!(context, "Database error: {:?}", e),
            StoreError::Io(e) => tracing::error!(context, "I/O error: {:?}", e),
            other => tracing::warn!(context, "{}", other),
        }
        SyncError::new(context, self.to_string())
    }
}

/// Result type alias for store functions.
pub type Result<T> = std::result::Result<T, StoreError>;
