use common::Id;
use domain::{Context, Entity, Transaction};
use store::{Backend, UnitOfWork, UnitOfWorkFactory};

use super::finish;
use crate::commands::RecordTransaction;
use crate::error::Result;

/// Records an income or expense and publishes `TransactionRecorded`.
pub struct RecordTransactionHandler<B: Backend> {
    uow_factory: UnitOfWorkFactory<B>,
}

impl<B: Backend> RecordTransactionHandler<B> {
    pub fn new(uow_factory: UnitOfWorkFactory<B>) -> Self {
        Self { uow_factory }
    }

    /// Returns the id of the new transaction.
    #[tracing::instrument(
        skip_all,
        fields(request_id = %ctx.request_id(), user_id = %command.user_id(), category_id = %command.category_id())
    )]
    pub async fn handle(&self, ctx: &Context, command: RecordTransaction) -> Result<Id> {
        let mut uow = self.uow_factory.create(ctx)?;
        let result = record(ctx, &mut uow, &command).await;
        finish(&mut uow, result).await
    }
}

async fn record<B: Backend>(
    ctx: &Context,
    uow: &mut UnitOfWork<B>,
    command: &RecordTransaction,
) -> Result<Id> {
    uow.begin(ctx).await?;

    let transaction = Transaction::new(
        command.user_id(),
        command.category_id(),
        command.amount(),
        command.transaction_type(),
    )?;
    uow.transaction_repository().add(ctx, &transaction).await?;

    uow.track(&transaction);
    uow.commit(ctx).await?;
    Ok(transaction.id())
}
