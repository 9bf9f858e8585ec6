use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::Id;
use domain::{Amount, Context, Entity, Transaction, TransactionType};
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::ports::TransactionRepository;
use crate::{Result, StoreError};

use super::{Session, write_error};

pub(super) struct PgTransactionRepository {
    session: Session,
}

impl PgTransactionRepository {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    fn row_to_transaction(row: PgRow) -> Result<Transaction> {
        let transaction_type: String = row.try_get("transaction_type")?;
        Ok(Transaction::restore(
            Id::from_uuid(row.try_get::<Uuid, _>("id")?),
            Id::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            Id::from_uuid(row.try_get::<Uuid, _>("category_id")?),
            Amount::from_minor(row.try_get("amount_minor")?)?,
            transaction_type.parse::<TransactionType>()?,
            row.try_get::<DateTime<Utc>, _>("created_at")?,
        ))
    }
}

#[async_trait]
impl TransactionRepository for PgTransactionRepository {
    async fn add(&self, ctx: &Context, transaction: &Transaction) -> Result<()> {
        ctx.run(async {
            let mut conn = self.session.conn().await?;
            sqlx::query(
                r#"
                INSERT INTO transactions (id, user_id, category_id, amount_minor, transaction_type, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(transaction.id().as_uuid())
            .bind(transaction.user_id().as_uuid())
            .bind(transaction.category_id().as_uuid())
            .bind(transaction.amount().minor_units())
            .bind(transaction.transaction_type().as_str())
            .bind(transaction.created_at())
            .execute(conn.executor()?)
            .await
            .map_err(|e| {
                write_error(
                    e,
                    || StoreError::already_exists("transaction", "id", transaction.id()),
                    |constraint| {
                        if constraint.contains("category_id") {
                            StoreError::not_found("category", transaction.category_id())
                        } else {
                            StoreError::not_found("user", transaction.user_id())
                        }
                    },
                )
            })?;
            Ok::<_, StoreError>(())
        })
        .await?
    }

    async fn list_by_user(&self, ctx: &Context, user_id: Id) -> Result<Vec<Transaction>> {
        ctx.run(async {
            let mut conn = self.session.conn().await?;
            let rows = sqlx::query(
                r#"
                SELECT id, user_id, category_id, amount_minor, transaction_type, created_at
                FROM transactions
                WHERE user_id = $1
                ORDER BY created_at ASC, id ASC
                "#,
            )
            .bind(user_id.as_uuid())
            .fetch_all(conn.executor()?)
            .await?;

            rows.into_iter()
                .map(Self::row_to_transaction)
                .collect::<Result<Vec<_>>>()
        })
        .await?
    }
}
