//! One handler per use case.
//!
//! Command handlers open a unit of work per call, run the use case inside
//! it, and roll back on every path that did not commit. Query handlers read
//! through a fresh unit of work without opening a transaction.

mod categories;
mod queries;
mod registration;
mod transactions;

pub use categories::CreateDefaultCategoriesHandler;
pub use queries::{GetUserCategoriesHandler, GetUserHandler};
pub use registration::RegisterUserHandler;
pub use transactions::RecordTransactionHandler;

use store::{Backend, UnitOfWork};
use tracing::error;

use crate::error::Result;

/// Rolls back unless the use case committed, then hands its result back.
///
/// A rollback failure is logged; the use case's own outcome wins.
async fn finish<B: Backend, T>(uow: &mut UnitOfWork<B>, result: Result<T>) -> Result<T> {
    if let Err(err) = uow.rollback_unless_committed().await {
        error!(error = %err, "rollback failed");
    }
    result
}
