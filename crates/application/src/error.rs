//! Application error types.

use common::Id;
use domain::{DeadlineExceeded, DispatchError, DomainError, ErrorKind};
use store::StoreError;
use thiserror::Error;

/// Errors returned by command and query handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input rejected by a command, query, or aggregate constructor.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Storage or unit-of-work failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An event subscriber failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The user already owns categories, so the defaults are not seeded.
    #[error("categories already exist for user {user_id}")]
    CategoriesAlreadyExist { user_id: Id },
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Domain(err) => err.kind(),
            AppError::Store(err) => err.kind(),
            AppError::Dispatch(err) => err.kind(),
            AppError::CategoriesAlreadyExist { .. } => ErrorKind::AlreadyExists,
        }
    }
}

impl From<DeadlineExceeded> for AppError {
    fn from(err: DeadlineExceeded) -> Self {
        AppError::Store(err.into())
    }
}

/// Convenience type alias for handler results.
pub type Result<T> = std::result::Result<T, AppError>;
