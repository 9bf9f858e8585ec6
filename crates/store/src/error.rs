use domain::{DeadlineExceeded, DomainError, ErrorKind};
use thiserror::Error;

/// Unit-of-work lifecycle misuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransactionStateError {
    #[error("transaction already started")]
    AlreadyActive,

    #[error("no active transaction")]
    NoActiveTransaction,

    #[error("unit of work already committed")]
    AlreadyCommitted,
}

/// Errors that can occur when interacting with storage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Begin/commit/rollback called in the wrong state.
    #[error(transparent)]
    TransactionState(#[from] TransactionStateError),

    /// The requested row does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// A uniqueness constraint rejected the write.
    #[error("{entity} with {field} '{value}' already exists")]
    AlreadyExists {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// The request deadline passed before the operation finished.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The driver reported the transaction as already finished.
    #[error("transaction already closed")]
    TransactionClosed,

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be turned back into a domain object.
    #[error("corrupted row: {0}")]
    Corrupted(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn already_exists(entity: &'static str, field: &'static str, value: impl ToString) -> Self {
        StoreError::AlreadyExists {
            entity,
            field,
            value: value.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::TransactionState(_) => ErrorKind::TransactionState,
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            StoreError::DeadlineExceeded
            | StoreError::TransactionClosed
            | StoreError::Database(_)
            | StoreError::Migration(_)
            | StoreError::Corrupted(_) => ErrorKind::Storage,
        }
    }
}

impl From<DeadlineExceeded> for StoreError {
    fn from(_: DeadlineExceeded) -> Self {
        StoreError::DeadlineExceeded
    }
}

impl From<DomainError> for StoreError {
    fn from(err: DomainError) -> Self {
        StoreError::Corrupted(err.to_string())
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;
