//! Domain error types.

use thiserror::Error;

/// Stable classification of every error the core can return.
///
/// Inbound adapters branch on this instead of matching concrete error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad constructor or command input.
    Validation,
    /// A looked-up entity does not exist.
    NotFound,
    /// A uniqueness rule was violated.
    AlreadyExists,
    /// Unit-of-work misuse (begin/commit/rollback out of order).
    TransactionState,
    /// Driver or SQL failure.
    Storage,
    /// A subscribed event handler failed.
    Dispatch,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::TransactionState => "transaction_state",
            ErrorKind::Storage => "storage",
            ErrorKind::Dispatch => "dispatch",
        };
        write!(f, "{s}")
    }
}

/// Errors raised while constructing or mutating domain objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A required value was missing or blank.
    #[error("value is required: {field}")]
    ValueRequired { field: &'static str },

    /// A value was present but not acceptable.
    #[error("value is invalid: {field}: {reason}")]
    ValueInvalid { field: &'static str, reason: String },

    /// A money amount could not be parsed or was not positive.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

impl DomainError {
    pub fn required(field: &'static str) -> Self {
        DomainError::ValueRequired { field }
    }

    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        DomainError::ValueInvalid {
            field,
            reason: reason.into(),
        }
    }

    /// Every domain error is a validation failure.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
