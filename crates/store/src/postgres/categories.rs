use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::Id;
use domain::{Category, CategoryType, Context, Entity};
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::ports::CategoryRepository;
use crate::{Result, StoreError};

use super::{Session, write_error};

pub(super) struct PgCategoryRepository {
    session: Session,
}

impl PgCategoryRepository {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    fn row_to_category(row: PgRow) -> Result<Category> {
        let category_type: String = row.try_get("category_type")?;
        Ok(Category::restore(
            Id::from_uuid(row.try_get::<Uuid, _>("id")?),
            row.try_get("name")?,
            Id::from_uuid(row.try_get::<Uuid, _>("owner_id")?),
            row.try_get::<Option<Uuid>, _>("parent_id")?.map(Id::from_uuid),
            category_type.parse::<CategoryType>()?,
            row.try_get::<DateTime<Utc>, _>("created_at")?,
        ))
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn create(&self, ctx: &Context, category: &Category) -> Result<()> {
        ctx.run(async {
            let mut conn = self.session.conn().await?;
            sqlx::query(
                r#"
                INSERT INTO categories (id, name, owner_id, parent_id, category_type, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(category.id().as_uuid())
            .bind(category.name())
            .bind(category.owner_id().as_uuid())
            .bind(category.parent_id().map(|id| id.as_uuid()))
            .bind(category.category_type().as_str())
            .bind(category.created_at())
            .execute(conn.executor()?)
            .await
            .map_err(|e| {
                write_error(
                    e,
                    || StoreError::already_exists("category", "id", category.id()),
                    |constraint| match category.parent_id() {
                        Some(parent) if constraint.contains("parent_id") => {
                            StoreError::not_found("category", parent)
                        }
                        _ => StoreError::not_found("user", category.owner_id()),
                    },
                )
            })?;
            Ok::<_, StoreError>(())
        })
        .await?
    }

    async fn has_any_for_user(&self, ctx: &Context, owner_id: Id) -> Result<bool> {
        ctx.run(async {
            let mut conn = self.session.conn().await?;
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM categories WHERE owner_id = $1)")
                    .bind(owner_id.as_uuid())
                    .fetch_one(conn.executor()?)
                    .await?;
            Ok::<_, StoreError>(exists)
        })
        .await?
    }

    async fn list_by_user_and_type(
        &self,
        ctx: &Context,
        owner_id: Id,
        category_type: CategoryType,
    ) -> Result<Vec<Category>> {
        ctx.run(async {
            let mut conn = self.session.conn().await?;
            // Ids are time-ordered, so they break created_at ties in insertion order.
            let rows = sqlx::query(
                r#"
                SELECT id, name, owner_id, parent_id, category_type, created_at
                FROM categories
                WHERE owner_id = $1 AND category_type = $2
                ORDER BY created_at ASC, id ASC
                "#,
            )
            .bind(owner_id.as_uuid())
            .bind(category_type.as_str())
            .fetch_all(conn.executor()?)
            .await?;

            rows.into_iter()
                .map(Self::row_to_category)
                .collect::<Result<Vec<_>>>()
        })
        .await?
    }
}
