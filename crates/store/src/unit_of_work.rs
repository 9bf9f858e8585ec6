//! Unit of work: one storage transaction, the repositories bound to it, and
//! the domain events its aggregates raised.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use domain::{AggregateRoot, Context, EventBuffer, Mediator};
use metrics::{counter, histogram};
use tracing::{debug, error, warn};

use crate::backend::{Backend, TxSlot};
use crate::error::{Result, StoreError, TransactionStateError};
use crate::ports::{
    CategoryRepository, ExternalIdentityRepository, TransactionRepository, UserRepository,
};

/// Budget for the cleanup rollback. It does not inherit the caller's
/// deadline, which may already have passed.
pub const ROLLBACK_TIMEOUT: Duration = Duration::from_secs(5);

/// Lifecycle of a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UowState {
    /// No transaction open. Initial state, and the state after a rollback
    /// or a failed commit.
    Idle,
    /// A transaction is open.
    Active,
    /// The transaction committed. Terminal.
    Committed,
}

/// Key of the repository memo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryKind {
    User,
    ExternalIdentity,
    Category,
    Transaction,
}

/// A memoized repository.
#[derive(Clone)]
pub enum Repository {
    User(Arc<dyn UserRepository>),
    ExternalIdentity(Arc<dyn ExternalIdentityRepository>),
    Category(Arc<dyn CategoryRepository>),
    Transaction(Arc<dyn TransactionRepository>),
}

/// Binds a storage transaction to repository access and to domain event
/// dispatch.
///
/// One unit per request, never shared between tasks. Typical use:
///
/// 1. `begin`
/// 2. mutate aggregates and persist them through this unit's repositories
/// 3. `track` every aggregate whose events should be published
/// 4. `commit`
///
/// with `rollback_unless_committed` on every exit path.
///
/// After the storage commit succeeds the tracked aggregates' events are
/// published through the [`Mediator`], in tracking order and then raise
/// order. Handler failures at that point are logged and counted; the commit
/// itself is already durable and still reported as a success.
pub struct UnitOfWork<B: Backend> {
    backend: B,
    mediator: Arc<Mediator>,
    slot: TxSlot<B::Tx>,
    state: UowState,
    tracked: Vec<EventBuffer>,
    repositories: HashMap<RepositoryKind, Repository>,
}

impl<B: Backend> UnitOfWork<B> {
    pub fn new(backend: B, mediator: Arc<Mediator>) -> Self {
        Self {
            backend,
            mediator,
            slot: TxSlot::new(),
            state: UowState::Idle,
            tracked: Vec::new(),
            repositories: HashMap::new(),
        }
    }

    pub fn state(&self) -> UowState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == UowState::Active
    }

    /// Number of aggregates tracked in the current cycle.
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    /// Opens the storage transaction.
    #[tracing::instrument(skip_all, fields(request_id = %ctx.request_id()))]
    pub async fn begin(&mut self, ctx: &Context) -> Result<()> {
        match self.state {
            UowState::Active => return Err(TransactionStateError::AlreadyActive.into()),
            UowState::Committed => return Err(TransactionStateError::AlreadyCommitted.into()),
            UowState::Idle => {}
        }

        let tx = ctx.run(self.backend.begin()).await??;
        self.slot.put(tx).await;
        self.state = UowState::Active;

        debug!("transaction started");
        Ok(())
    }

    /// Commits the transaction, then publishes the tracked aggregates'
    /// events.
    ///
    /// If the storage commit fails the unit returns to `Idle`, the error is
    /// returned, and nothing is published.
    #[tracing::instrument(skip_all, fields(request_id = %ctx.request_id(), tracked = self.tracked.len()))]
    pub async fn commit(&mut self, ctx: &Context) -> Result<()> {
        match self.state {
            UowState::Idle => return Err(TransactionStateError::NoActiveTransaction.into()),
            UowState::Committed => return Err(TransactionStateError::AlreadyCommitted.into()),
            UowState::Active => {}
        }

        let Some(tx) = self.slot.take().await else {
            self.state = UowState::Idle;
            return Err(TransactionStateError::NoActiveTransaction.into());
        };

        let start = Instant::now();
        let outcome = match ctx.run(self.backend.commit(tx)).await {
            Ok(result) => result,
            Err(deadline) => Err(deadline.into()),
        };

        if let Err(err) = outcome {
            self.state = UowState::Idle;
            self.tracked.clear();
            counter!("uow_commit_failures_total").increment(1);
            warn!(error = %err, "commit failed");
            return Err(err);
        }

        self.state = UowState::Committed;
        histogram!("uow_commit_duration_seconds").record(start.elapsed().as_secs_f64());
        counter!("uow_commits_total").increment(1);
        debug!("transaction committed");

        self.publish_domain_events(ctx).await;
        Ok(())
    }

    /// Rolls back an open transaction. A no-op when nothing is open or the
    /// unit already committed, so it is safe on every exit path.
    pub async fn rollback_unless_committed(&mut self) -> Result<()> {
        if self.state != UowState::Active {
            return Ok(());
        }

        self.state = UowState::Idle;
        self.tracked.clear();

        let Some(tx) = self.slot.take().await else {
            return Ok(());
        };

        let result = match tokio::time::timeout(ROLLBACK_TIMEOUT, self.backend.rollback(tx)).await
        {
            Ok(result) => result,
            Err(_) => Err(StoreError::DeadlineExceeded),
        };

        match result {
            Ok(()) | Err(StoreError::TransactionClosed) => {
                counter!("uow_rollbacks_total").increment(1);
                debug!("transaction rolled back");
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "rollback failed");
                Err(err)
            }
        }
    }

    /// Registers an aggregate whose events should be published on commit.
    ///
    /// Tracking the same aggregate twice is harmless: its buffer is drained
    /// by the first pass.
    pub fn track(&mut self, aggregate: &impl AggregateRoot) {
        self.tracked.push(aggregate.event_buffer());
    }

    async fn publish_domain_events(&mut self, ctx: &Context) {
        for buffer in std::mem::take(&mut self.tracked) {
            for event in buffer.take() {
                let kind = event.kind();
                if !event.is_valid() {
                    warn!(%kind, event_id = %event.id(), "skipping invalid domain event");
                    continue;
                }

                match self.mediator.publish(ctx, event.as_ref()).await {
                    Ok(()) => {
                        counter!("domain_events_dispatched_total", "kind" => kind.as_str())
                            .increment(1);
                    }
                    Err(err) => {
                        counter!("domain_event_dispatch_failures_total", "kind" => kind.as_str())
                            .increment(1);
                        error!(%kind, event_id = %event.id(), error = %err, "domain event dispatch failed");
                    }
                }
            }
        }
    }

    pub fn user_repository(&mut self) -> Arc<dyn UserRepository> {
        if let Some(Repository::User(repo)) = self.repositories.get(&RepositoryKind::User) {
            return Arc::clone(repo);
        }
        let repo = self.backend.user_repository(self.slot.clone());
        self.repositories
            .insert(RepositoryKind::User, Repository::User(Arc::clone(&repo)));
        repo
    }

    pub fn external_identity_repository(&mut self) -> Arc<dyn ExternalIdentityRepository> {
        if let Some(Repository::ExternalIdentity(repo)) =
            self.repositories.get(&RepositoryKind::ExternalIdentity)
        {
            return Arc::clone(repo);
        }
        let repo = self.backend.external_identity_repository(self.slot.clone());
        self.repositories.insert(
            RepositoryKind::ExternalIdentity,
            Repository::ExternalIdentity(Arc::clone(&repo)),
        );
        repo
    }

    pub fn category_repository(&mut self) -> Arc<dyn CategoryRepository> {
        if let Some(Repository::Category(repo)) = self.repositories.get(&RepositoryKind::Category)
        {
            return Arc::clone(repo);
        }
        let repo = self.backend.category_repository(self.slot.clone());
        self.repositories
            .insert(RepositoryKind::Category, Repository::Category(Arc::clone(&repo)));
        repo
    }

    pub fn transaction_repository(&mut self) -> Arc<dyn TransactionRepository> {
        if let Some(Repository::Transaction(repo)) =
            self.repositories.get(&RepositoryKind::Transaction)
        {
            return Arc::clone(repo);
        }
        let repo = self.backend.transaction_repository(self.slot.clone());
        self.repositories.insert(
            RepositoryKind::Transaction,
            Repository::Transaction(Arc::clone(&repo)),
        );
        repo
    }
}

impl<B: Backend> Drop for UnitOfWork<B> {
    fn drop(&mut self) {
        if self.state == UowState::Active {
            warn!("unit of work dropped with an open transaction; it will be discarded");
        }
    }
}

impl<B: Backend> std::fmt::Debug for UnitOfWork<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("state", &self.state)
            .field("tracked", &self.tracked.len())
            .field("repositories", &self.repositories.len())
            .finish()
    }
}

/// Hands out a fresh [`UnitOfWork`] per request.
///
/// Holds only the backend and the shared mediator.
pub struct UnitOfWorkFactory<B: Backend> {
    backend: B,
    mediator: Arc<Mediator>,
}

impl<B: Backend> UnitOfWorkFactory<B> {
    pub fn new(backend: B, mediator: Arc<Mediator>) -> Self {
        Self { backend, mediator }
    }

    /// Fails with `DeadlineExceeded` when `ctx` has already expired.
    pub fn create(&self, ctx: &Context) -> Result<UnitOfWork<B>> {
        ctx.check()?;
        Ok(UnitOfWork::new(
            self.backend.clone(),
            Arc::clone(&self.mediator),
        ))
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn mediator(&self) -> &Arc<Mediator> {
        &self.mediator
    }
}

impl<B: Backend> Clone for UnitOfWorkFactory<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            mediator: Arc::clone(&self.mediator),
        }
    }
}
