use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::Id;
use domain::{Context, Entity, ExternalIdentity, Provider, User};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};
use uuid::Uuid;

use crate::ports::UserRepository;
use crate::{Result, StoreError};

use super::{Session, write_error};

pub(super) struct PgUserRepository {
    session: Session,
}

impl PgUserRepository {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    fn row_to_identity(row: PgRow) -> Result<ExternalIdentity> {
        let provider: String = row.try_get("provider")?;
        Ok(ExternalIdentity::restore(
            Id::from_uuid(row.try_get::<Uuid, _>("id")?),
            Id::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            provider.parse::<Provider>()?,
            row.try_get("external_id")?,
            row.try_get::<DateTime<Utc>, _>("created_at")?,
        ))
    }

    /// Rebuilds the user in `row` together with its identities.
    async fn load(conn: &mut PgConnection, row: PgRow) -> Result<User> {
        let id = Id::from_uuid(row.try_get::<Uuid, _>("id")?);
        let identities = sqlx::query(
            r#"
            SELECT id, user_id, provider, external_id, created_at
            FROM external_identities
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(Self::row_to_identity)
        .collect::<Result<Vec<_>>>()?;

        Ok(User::restore(
            id,
            row.try_get("name")?,
            row.try_get("created_at")?,
            identities,
        ))
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, ctx: &Context, user: &User) -> Result<()> {
        ctx.run(async {
            let mut conn = self.session.conn().await?;
            sqlx::query("INSERT INTO users (id, name, created_at) VALUES ($1, $2, $3)")
                .bind(user.id().as_uuid())
                .bind(user.name())
                .bind(user.created_at())
                .execute(conn.executor()?)
                .await
                .map_err(|e| {
                    write_error(
                        e,
                        || StoreError::already_exists("user", "id", user.id()),
                        |constraint| StoreError::not_found("reference", constraint),
                    )
                })?;
            Ok::<_, StoreError>(())
        })
        .await?
    }

    async fn find_by_id(&self, ctx: &Context, id: Id) -> Result<User> {
        ctx.run(async {
            let mut conn = self.session.conn().await?;
            let row = sqlx::query("SELECT id, name, created_at FROM users WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(conn.executor()?)
                .await?
                .ok_or_else(|| StoreError::not_found("user", id))?;
            Self::load(conn.executor()?, row).await
        })
        .await?
    }

    async fn lock_for_update(&self, ctx: &Context, id: Id) -> Result<()> {
        ctx.run(async {
            let mut conn = self.session.conn().await?;
            sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
                .bind(id.as_uuid())
                .fetch_optional(conn.executor()?)
                .await?
                .ok_or_else(|| StoreError::not_found("user", id))?;
            Ok::<_, StoreError>(())
        })
        .await?
    }

    async fn find_by_external_identity(
        &self,
        ctx: &Context,
        provider: Provider,
        external_id: &str,
    ) -> Result<User> {
        ctx.run(async {
            let mut conn = self.session.conn().await?;
            let row = sqlx::query(
                r#"
                SELECT u.id, u.name, u.created_at
                FROM users u
                INNER JOIN external_identities ei ON u.id = ei.user_id
                WHERE ei.provider = $1 AND ei.external_id = $2
                "#,
            )
            .bind(provider.as_str())
            .bind(external_id)
            .fetch_optional(conn.executor()?)
            .await?
            .ok_or_else(|| StoreError::not_found("user", format!("{provider}:{external_id}")))?;
            Self::load(conn.executor()?, row).await
        })
        .await?
    }
}
