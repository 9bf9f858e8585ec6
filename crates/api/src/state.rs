//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use application::{
    CreateDefaultCategoriesHandler, GetUserCategoriesHandler, GetUserHandler, MessageSender,
    RecordTransactionHandler, RegisterUserHandler, build_mediator,
};
use axum::http::HeaderMap;
use domain::Context;
use store::{Backend, UnitOfWorkFactory};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Use-case handlers shared by every route.
pub struct AppState<B: Backend> {
    pub register_user: RegisterUserHandler<B>,
    pub create_default_categories: CreateDefaultCategoriesHandler<B>,
    pub record_transaction: RecordTransactionHandler<B>,
    pub get_user: GetUserHandler<B>,
    pub get_user_categories: GetUserCategoriesHandler<B>,
    uow_factory: UnitOfWorkFactory<B>,
    request_timeout: Duration,
}

impl<B: Backend> AppState<B> {
    /// Wires every handler to `backend`, with the standard event subscribers
    /// delivering messages through `sender`.
    pub fn new(backend: B, sender: Arc<dyn MessageSender>, request_timeout: Duration) -> Self {
        let mediator = Arc::new(build_mediator(sender));
        let uow_factory = UnitOfWorkFactory::new(backend, mediator);

        Self {
            register_user: RegisterUserHandler::new(uow_factory.clone()),
            create_default_categories: CreateDefaultCategoriesHandler::new(uow_factory.clone()),
            record_transaction: RecordTransactionHandler::new(uow_factory.clone()),
            get_user: GetUserHandler::new(uow_factory.clone()),
            get_user_categories: GetUserCategoriesHandler::new(uow_factory.clone()),
            uow_factory,
            request_timeout,
        }
    }

    /// Opens and rolls back a transaction to prove the storage is reachable.
    pub async fn probe_storage(&self, ctx: &Context) -> store::Result<()> {
        let mut uow = self.uow_factory.create(ctx)?;
        uow.begin(ctx).await?;
        uow.rollback_unless_committed().await
    }

    /// Request context bounded by the configured timeout. A valid
    /// `x-request-id` header is reused as the request id.
    pub fn context(&self, headers: &HeaderMap) -> Context {
        let ctx = Context::background().with_timeout(self.request_timeout);
        match headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
        {
            Some(request_id) => ctx.with_request_id(request_id),
            None => ctx,
        }
    }
}
