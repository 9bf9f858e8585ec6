use async_trait::async_trait;
use domain::{Context, Entity, ExternalIdentity};

use crate::ports::ExternalIdentityRepository;
use crate::{Result, StoreError};

use super::{Session, write_error};

pub(super) struct PgExternalIdentityRepository {
    session: Session,
}

impl PgExternalIdentityRepository {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl ExternalIdentityRepository for PgExternalIdentityRepository {
    async fn add(&self, ctx: &Context, identity: &ExternalIdentity) -> Result<()> {
        ctx.run(async {
            let mut conn = self.session.conn().await?;
            sqlx::query(
                r#"
                INSERT INTO external_identities (id, user_id, provider, external_id, created_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(identity.id().as_uuid())
            .bind(identity.user_id().as_uuid())
            .bind(identity.provider().as_str())
            .bind(identity.external_id())
            .bind(identity.created_at())
            .execute(conn.executor()?)
            .await
            .map_err(|e| {
                write_error(
                    e,
                    || {
                        StoreError::already_exists(
                            "external identity",
                            "external_id",
                            identity.external_id(),
                        )
                    },
                    |_| StoreError::not_found("user", identity.user_id()),
                )
            })?;
            Ok::<_, StoreError>(())
        })
        .await?
    }
}
