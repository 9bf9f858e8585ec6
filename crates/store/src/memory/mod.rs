//! In-memory storage backend.
//!
//! Tables live behind a shared tokio `RwLock`. A transaction is a journal of
//! pending inserts: statements run through the same slot see them, other
//! units do not, and they are checked again and applied in one step at
//! commit. A transaction that locks a user row holds that user's mutex until
//! it ends. Used by tests and by the server when no database is configured.

mod repositories;
mod tables;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::Id;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::backend::{Backend, TxSlot};
use crate::ports::{
    CategoryRepository, ExternalIdentityRepository, TransactionRepository, UserRepository,
};
use crate::error::TransactionStateError;
use crate::{Result, StoreError};

use repositories::{
    MemoryCategoryRepository, MemoryExternalIdentityRepository, MemoryTransactionRepository,
    MemoryUserRepository,
};
use tables::Tables;

/// Open in-memory transaction: the inserts it has buffered so far and the
/// user rows it has locked.
#[derive(Debug, Default)]
pub struct MemoryTx {
    pending: Tables,
    locked_users: HashMap<Id, OwnedMutexGuard<()>>,
}

/// Number of committed rows per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub users: usize,
    pub external_identities: usize,
    pub categories: usize,
    pub transactions: usize,
}

/// In-memory backend for testing.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    tables: Arc<RwLock<Tables>>,
    locks: RowLocks,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the committed row counts.
    pub async fn row_counts(&self) -> RowCounts {
        self.tables.read().await.counts()
    }

    /// Clears all tables.
    pub async fn clear(&self) {
        *self.tables.write().await = Tables::default();
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx> {
        Ok(MemoryTx::default())
    }

    async fn commit(&self, tx: MemoryTx) -> Result<()> {
        let MemoryTx {
            pending,
            locked_users,
        } = tx;
        let mut tables = self.tables.write().await;
        // Another unit may have committed a conflicting row since the insert.
        tables.check_insertable(&pending).map_err(conflict_error)?;
        tables.apply(pending);
        // Waiters on these rows must see the applied inserts.
        drop(tables);
        drop(locked_users);
        Ok(())
    }

    async fn rollback(&self, tx: MemoryTx) -> Result<()> {
        drop(tx);
        Ok(())
    }

    fn user_repository(&self, slot: TxSlot<MemoryTx>) -> Arc<dyn UserRepository> {
        Arc::new(MemoryUserRepository::new(self.store(slot)))
    }

    fn external_identity_repository(
        &self,
        slot: TxSlot<MemoryTx>,
    ) -> Arc<dyn ExternalIdentityRepository> {
        Arc::new(MemoryExternalIdentityRepository::new(self.store(slot)))
    }

    fn category_repository(&self, slot: TxSlot<MemoryTx>) -> Arc<dyn CategoryRepository> {
        Arc::new(MemoryCategoryRepository::new(self.store(slot)))
    }

    fn transaction_repository(&self, slot: TxSlot<MemoryTx>) -> Arc<dyn TransactionRepository> {
        Arc::new(MemoryTransactionRepository::new(self.store(slot)))
    }
}

impl InMemoryBackend {
    fn store(&self, slot: TxSlot<MemoryTx>) -> SlotStore {
        SlotStore {
            tables: Arc::clone(&self.tables),
            locks: self.locks.clone(),
            slot,
        }
    }
}

/// One mutex per locked user row, created on first use.
#[derive(Clone, Default)]
struct RowLocks(Arc<Mutex<HashMap<Id, Arc<Mutex<()>>>>>);

impl RowLocks {
    async fn acquire(&self, id: Id) -> OwnedMutexGuard<()> {
        let row = Arc::clone(self.0.lock().await.entry(id).or_default());
        row.lock_owned().await
    }
}

/// Committed tables plus the transaction slot of one unit of work.
#[derive(Clone)]
struct SlotStore {
    tables: Arc<RwLock<Tables>>,
    locks: RowLocks,
    slot: TxSlot<MemoryTx>,
}

impl SlotStore {
    /// Runs `f` over the committed rows and, when a transaction is open, its
    /// pending rows.
    async fn read<R>(&self, f: impl FnOnce(tables::View<'_>) -> R) -> R {
        let slot = self.slot.lock().await;
        let committed = self.tables.read().await;
        f(tables::View::new(&committed, slot.as_ref().map(|tx| &tx.pending)))
    }

    /// Holds the lock on user `id` until the open transaction ends. The slot
    /// is not held while waiting for the lock.
    async fn lock_user(&self, id: Id) -> Result<()> {
        if !self.read(|view| view.users().any(|u| u.id == id)).await {
            return Err(StoreError::not_found("user", id));
        }

        let already_held = match self.slot.lock().await.as_ref() {
            Some(tx) => tx.locked_users.contains_key(&id),
            None => return Ok(()),
        };
        if already_held {
            return Ok(());
        }

        let guard = self.locks.acquire(id).await;
        let mut slot = self.slot.lock().await;
        let tx = slot.as_mut().ok_or(StoreError::TransactionState(
            TransactionStateError::NoActiveTransaction,
        ))?;
        tx.locked_users.insert(id, guard);
        Ok(())
    }

    /// Buffers `rows` in the open transaction, or applies them at once when
    /// there is none.
    async fn write(&self, rows: Tables) -> Result<()> {
        let mut slot = self.slot.lock().await;
        match slot.as_mut() {
            Some(tx) => {
                let committed = self.tables.read().await;
                tables::View::new(&committed, Some(&tx.pending))
                    .check_insertable(&rows)
                    .map_err(conflict_error)?;
                tx.pending.apply(rows);
            }
            None => {
                let mut committed = self.tables.write().await;
                committed.check_insertable(&rows).map_err(conflict_error)?;
                committed.apply(rows);
            }
        }
        Ok(())
    }
}

fn conflict_error(conflict: tables::Conflict) -> StoreError {
    match conflict {
        tables::Conflict::Duplicate {
            entity,
            field,
            value,
        } => StoreError::already_exists(entity, field, value),
        tables::Conflict::MissingReference { entity, key } => StoreError::not_found(entity, key),
    }
}
