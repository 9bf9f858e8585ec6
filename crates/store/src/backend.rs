//! Storage backend abstraction used by the unit of work.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, MutexGuard};

use crate::Result;
use crate::ports::{
    CategoryRepository, ExternalIdentityRepository, TransactionRepository, UserRepository,
};

/// Shared holder of a unit of work's open transaction.
///
/// The unit of work puts the transaction in at begin and takes it out at
/// commit or rollback; repositories built for that unit hold a clone of the
/// slot and borrow the transaction for each statement.
pub struct TxSlot<T>(Arc<Mutex<Option<T>>>);

impl<T> TxSlot<T> {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(None)))
    }

    pub async fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.0.lock().await
    }

    /// Stores `tx`, returning whatever was there before.
    pub async fn put(&self, tx: T) -> Option<T> {
        self.0.lock().await.replace(tx)
    }

    pub async fn take(&self) -> Option<T> {
        self.0.lock().await.take()
    }

    pub async fn is_open(&self) -> bool {
        self.0.lock().await.is_some()
    }

    /// True when both handles refer to the same slot.
    pub fn same_slot(&self, other: &TxSlot<T>) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Clone for TxSlot<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Default for TxSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for TxSlot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxSlot").finish_non_exhaustive()
    }
}

/// A transactional store able to build repositories bound to a [`TxSlot`].
///
/// Implementations must be cheap to clone; clones share the same
/// connection pool or tables.
#[async_trait]
pub trait Backend: Clone + Send + Sync + 'static {
    type Tx: Send + 'static;

    async fn begin(&self) -> Result<Self::Tx>;

    async fn commit(&self, tx: Self::Tx) -> Result<()>;

    /// Discards `tx`. Returns `StoreError::TransactionClosed` when the
    /// driver reports the transaction as already finished.
    async fn rollback(&self, tx: Self::Tx) -> Result<()>;

    fn user_repository(&self, slot: TxSlot<Self::Tx>) -> Arc<dyn UserRepository>;

    fn external_identity_repository(
        &self,
        slot: TxSlot<Self::Tx>,
    ) -> Arc<dyn ExternalIdentityRepository>;

    fn category_repository(&self, slot: TxSlot<Self::Tx>) -> Arc<dyn CategoryRepository>;

    fn transaction_repository(&self, slot: TxSlot<Self::Tx>) -> Arc<dyn TransactionRepository>;
}
