//! Transactional storage for the finance tracker.
//!
//! A [`UnitOfWork`] owns one storage transaction, hands out repositories
//! bound to it, and publishes the domain events of the aggregates it tracked
//! once the transaction commits. Two [`Backend`]s are provided: PostgreSQL
//! and an in-memory one for tests.

pub mod backend;
pub mod error;
pub mod memory;
pub mod ports;
pub mod postgres;
pub mod unit_of_work;

pub use backend::{Backend, TxSlot};
pub use error::{Result, StoreError, TransactionStateError};
pub use memory::{InMemoryBackend, MemoryTx, RowCounts};
pub use ports::{
    CategoryRepository, ExternalIdentityRepository, TransactionRepository, UserRepository,
};
pub use postgres::{PgBackend, PgTx};
pub use unit_of_work::{
    ROLLBACK_TIMEOUT, Repository, RepositoryKind, UnitOfWork, UnitOfWorkFactory, UowState,
};
