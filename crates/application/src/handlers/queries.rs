use domain::Context;
use store::{Backend, UnitOfWorkFactory};

use crate::error::Result;
use crate::queries::{CategoryView, GetUser, GetUserCategories, UserView};

/// Looks a user up by one of their external accounts.
pub struct GetUserHandler<B: Backend> {
    uow_factory: UnitOfWorkFactory<B>,
}

impl<B: Backend> GetUserHandler<B> {
    pub fn new(uow_factory: UnitOfWorkFactory<B>) -> Self {
        Self { uow_factory }
    }

    #[tracing::instrument(skip_all, fields(request_id = %ctx.request_id(), provider = %query.provider()))]
    pub async fn handle(&self, ctx: &Context, query: GetUser) -> Result<UserView> {
        let mut uow = self.uow_factory.create(ctx)?;
        let user = uow
            .user_repository()
            .find_by_external_identity(ctx, query.provider(), query.external_id())
            .await?;
        Ok(UserView::from(&user))
    }
}

/// Lists a user's income or expense categories, parents before children.
pub struct GetUserCategoriesHandler<B: Backend> {
    uow_factory: UnitOfWorkFactory<B>,
}

impl<B: Backend> GetUserCategoriesHandler<B> {
    pub fn new(uow_factory: UnitOfWorkFactory<B>) -> Self {
        Self { uow_factory }
    }

    #[tracing::instrument(
        skip_all,
        fields(request_id = %ctx.request_id(), user_id = %query.user_id(), category_type = %query.category_type())
    )]
    pub async fn handle(&self, ctx: &Context, query: GetUserCategories) -> Result<Vec<CategoryView>> {
        let mut uow = self.uow_factory.create(ctx)?;
        let categories = uow
            .category_repository()
            .list_by_user_and_type(ctx, query.user_id(), query.category_type())
            .await?;
        Ok(categories.iter().map(CategoryView::from).collect())
    }
}
