use domain::{Category, Context, Entity};
use store::{Backend, UnitOfWork, UnitOfWorkFactory};
use tracing::info;

use super::finish;
use crate::commands::CreateDefaultCategories;
use crate::default_categories::DEFAULT_CATEGORIES;
use crate::error::{AppError, Result};
use crate::queries::DefaultCategoriesCreated;

/// Seeds the default category tree for a registered user.
///
/// The whole tree is written in one transaction. A user who already owns any
/// category is left untouched. The user row stays locked from the check to
/// the commit, so concurrent requests for one user seed at most once.
pub struct CreateDefaultCategoriesHandler<B: Backend> {
    uow_factory: UnitOfWorkFactory<B>,
}

impl<B: Backend> CreateDefaultCategoriesHandler<B> {
    pub fn new(uow_factory: UnitOfWorkFactory<B>) -> Self {
        Self { uow_factory }
    }

    #[tracing::instrument(
        skip_all,
        fields(request_id = %ctx.request_id(), provider = %command.provider(), external_id = command.external_id())
    )]
    pub async fn handle(
        &self,
        ctx: &Context,
        command: CreateDefaultCategories,
    ) -> Result<DefaultCategoriesCreated> {
        let mut uow = self.uow_factory.create(ctx)?;
        let result = create_defaults(ctx, &mut uow, &command).await;
        finish(&mut uow, result).await
    }
}

async fn create_defaults<B: Backend>(
    ctx: &Context,
    uow: &mut UnitOfWork<B>,
    command: &CreateDefaultCategories,
) -> Result<DefaultCategoriesCreated> {
    uow.begin(ctx).await?;

    let users = uow.user_repository();
    let user = users
        .find_by_external_identity(ctx, command.provider(), command.external_id())
        .await?;
    users.lock_for_update(ctx, user.id()).await?;

    let categories = uow.category_repository();
    if categories.has_any_for_user(ctx, user.id()).await? {
        return Err(AppError::CategoriesAlreadyExist { user_id: user.id() });
    }

    let mut created = DefaultCategoriesCreated {
        user_id: user.id(),
        parents: 0,
        children: 0,
    };
    for group in DEFAULT_CATEGORIES {
        let parent = Category::new(group.name, user.id(), None, group.category_type)?;
        categories.create(ctx, &parent).await?;
        created.parents += 1;

        for name in group.children {
            let child = Category::new(name, user.id(), Some(parent.id()), group.category_type)?;
            categories.create(ctx, &child).await?;
            created.children += 1;
        }
    }

    uow.commit(ctx).await?;

    info!(
        user_id = %user.id(),
        parents = created.parents,
        children = created.children,
        "default categories created"
    );
    Ok(created)
}
