use common::Id;
use domain::{Context, Entity, ErrorKind, User};
use metrics::counter;
use store::{Backend, StoreError, UnitOfWork, UnitOfWorkFactory, UserRepository};
use tracing::info;

use super::finish;
use crate::commands::RegisterUser;
use crate::error::Result;
use crate::queries::Registration;

/// Registers a user behind an external account, or returns the existing one.
///
/// When a concurrent request links the same account first, the unique key on
/// the account rejects this one and the winner's user is returned instead.
pub struct RegisterUserHandler<B: Backend> {
    uow_factory: UnitOfWorkFactory<B>,
}

impl<B: Backend> RegisterUserHandler<B> {
    pub fn new(uow_factory: UnitOfWorkFactory<B>) -> Self {
        Self { uow_factory }
    }

    #[tracing::instrument(
        skip_all,
        fields(request_id = %ctx.request_id(), provider = %command.provider(), external_id = command.external_id())
    )]
    pub async fn handle(&self, ctx: &Context, command: RegisterUser) -> Result<Registration> {
        let mut uow = self.uow_factory.create(ctx)?;
        let result = register(ctx, &mut uow, &command).await;
        match finish(&mut uow, result).await {
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                self.registered_concurrently(ctx, &command)
                    .await?
                    .ok_or(err)
            }
            other => other,
        }
    }

    async fn registered_concurrently(
        &self,
        ctx: &Context,
        command: &RegisterUser,
    ) -> Result<Option<Registration>> {
        let mut uow = self.uow_factory.create(ctx)?;
        let users = uow.user_repository();
        let registration = existing_user(ctx, users.as_ref(), command)
            .await?
            .map(|user_id| Registration {
                user_id,
                created: false,
            });
        if let Some(registration) = &registration {
            info!(user_id = %registration.user_id, "account registered concurrently");
        }
        Ok(registration)
    }
}

async fn register<B: Backend>(
    ctx: &Context,
    uow: &mut UnitOfWork<B>,
    command: &RegisterUser,
) -> Result<Registration> {
    uow.begin(ctx).await?;

    let users = uow.user_repository();
    if let Some(user_id) = existing_user(ctx, users.as_ref(), command).await? {
        info!(%user_id, "account already registered");
        return Ok(Registration {
            user_id,
            created: false,
        });
    }

    let user = User::register(command.name(), command.provider(), command.external_id())?;
    users.create(ctx, &user).await?;

    let identities = uow.external_identity_repository();
    for identity in user.external_identities() {
        identities.add(ctx, identity).await?;
    }

    uow.track(&user);
    uow.commit(ctx).await?;

    counter!("users_registered_total").increment(1);
    info!(user_id = %user.id(), "user registered");
    Ok(Registration {
        user_id: user.id(),
        created: true,
    })
}

async fn existing_user(
    ctx: &Context,
    users: &dyn UserRepository,
    command: &RegisterUser,
) -> Result<Option<Id>> {
    match users
        .find_by_external_identity(ctx, command.provider(), command.external_id())
        .await
    {
        Ok(user) => Ok(Some(user.id())),
        Err(StoreError::NotFound { .. }) => Ok(None),
        Err(err) => Err(err.into()),
    }
}
