//! Error types for stamp count synchronization and the in-memory backend.

use thiserror::Error;

/// Errors surfaced by [`StampCountSync`](crate::StampCountSync) and its watches.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("No authenticated identity")]
    Unauthenticated,

    #[error("Remote query failed: {0}")]
    RemoteQuery(String),

    #[error("Watch bootstrap failed: {0}")]
    SubscriptionBootstrap(Box<SyncError>),

    #[error("Change feed subscription failed: {0}")]
    Subscription(String),
}

impl SyncError {
    /// The human-readable message without the variant prefix.
    pub fn message(&self) -> String {
        match self {
            SyncError::Unauthenticated => "No authenticated identity".to_string(),
            SyncError::RemoteQuery(msg) | SyncError::Subscription(msg) => msg.clone(),
            SyncError::SubscriptionBootstrap(inner) => inner.message(),
        }
    }
}

/// Errors raised by [`MemoryStore`](crate::MemoryStore) mutations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Row not found: {table}/{id}")]
    RowNotFound { table: String, id: String },

    #[error("Row already exists: {table}/{id}")]
    DuplicateRow { table: String, id: String },

    #[error("Invalid row: {0}")]
    InvalidRow(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Result type for in-memory store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
