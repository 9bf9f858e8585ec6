//! PostgreSQL storage backend.

mod categories;
mod identities;
mod transactions;
mod users;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, PgPool, Postgres};
use tokio::sync::MutexGuard;

use crate::backend::{Backend, TxSlot};
use crate::error::TransactionStateError;
use crate::ports::{
    CategoryRepository, ExternalIdentityRepository, TransactionRepository, UserRepository,
};
use crate::{Result, StoreError};

use categories::PgCategoryRepository;
use identities::PgExternalIdentityRepository;
use transactions::PgTransactionRepository;
use users::PgUserRepository;

/// An open PostgreSQL transaction.
pub type PgTx = sqlx::Transaction<'static, Postgres>;

/// PostgreSQL-backed storage.
#[derive(Clone)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    /// Creates a new PostgreSQL backend.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn session(&self, slot: TxSlot<PgTx>) -> Session {
        Session {
            pool: self.pool.clone(),
            slot,
        }
    }
}

#[async_trait]
impl Backend for PgBackend {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx> {
        Ok(self.pool.begin().await?)
    }

    async fn commit(&self, tx: PgTx) -> Result<()> {
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&self, tx: PgTx) -> Result<()> {
        tx.rollback().await.map_err(rollback_error)
    }

    fn user_repository(&self, slot: TxSlot<PgTx>) -> Arc<dyn UserRepository> {
        Arc::new(PgUserRepository::new(self.session(slot)))
    }

    fn external_identity_repository(
        &self,
        slot: TxSlot<PgTx>,
    ) -> Arc<dyn ExternalIdentityRepository> {
        Arc::new(PgExternalIdentityRepository::new(self.session(slot)))
    }

    fn category_repository(&self, slot: TxSlot<PgTx>) -> Arc<dyn CategoryRepository> {
        Arc::new(PgCategoryRepository::new(self.session(slot)))
    }

    fn transaction_repository(&self, slot: TxSlot<PgTx>) -> Arc<dyn TransactionRepository> {
        Arc::new(PgTransactionRepository::new(self.session(slot)))
    }
}

/// A connection whose transaction has already gone away cannot roll back.
fn rollback_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Io(_) | sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed => {
            StoreError::TransactionClosed
        }
        other => StoreError::Database(other),
    }
}

/// Maps constraint violations of a write; anything else stays a database
/// error. `on_foreign_key` receives the violated constraint's name.
fn write_error(
    err: sqlx::Error,
    on_unique: impl FnOnce() -> StoreError,
    on_foreign_key: impl FnOnce(&str) -> StoreError,
) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return on_unique();
        }
        if db_err.is_foreign_key_violation() {
            return on_foreign_key(db_err.constraint().unwrap_or_default());
        }
    }
    StoreError::Database(err)
}

/// Pool plus the transaction slot of one unit of work.
#[derive(Clone)]
struct Session {
    pool: PgPool,
    slot: TxSlot<PgTx>,
}

impl Session {
    /// The unit's open transaction, or a pooled connection when none is open.
    async fn conn(&self) -> Result<Conn<'_>> {
        let slot = self.slot.lock().await;
        if slot.is_some() {
            return Ok(Conn::Tx(slot));
        }
        drop(slot);
        Ok(Conn::Pool(self.pool.acquire().await?))
    }
}

enum Conn<'a> {
    Tx(MutexGuard<'a, Option<PgTx>>),
    Pool(PoolConnection<Postgres>),
}

impl Conn<'_> {
    fn executor(&mut self) -> Result<&mut PgConnection> {
        match self {
            Conn::Tx(slot) => slot
                .as_mut()
                .map(|tx| &mut **tx)
                .ok_or(StoreError::TransactionState(
                    TransactionStateError::NoActiveTransaction,
                )),
            Conn::Pool(conn) => Ok(&mut **conn),
        }
    }
}
