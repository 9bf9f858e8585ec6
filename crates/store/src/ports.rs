//! Repository contracts.
//!
//! Every method takes the request [`Context`] and is bounded by its deadline.
//! A repository obtained from a unit of work runs inside that unit's
//! transaction when one is open, and directly against the backend otherwise.

use async_trait::async_trait;
use common::Id;
use domain::{Category, CategoryType, Context, ExternalIdentity, Provider, Transaction, User};

use crate::Result;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts the user row. Identities are persisted separately.
    async fn create(&self, ctx: &Context, user: &User) -> Result<()>;

    async fn find_by_id(&self, ctx: &Context, id: Id) -> Result<User>;

    /// Locks the user row until the open transaction ends, so writes that
    /// depend on the user's current rows run one at a time. Without an open
    /// transaction it only checks that the user exists.
    async fn lock_for_update(&self, ctx: &Context, id: Id) -> Result<()>;

    /// Looks a user up through one of its linked accounts. The user comes
    /// back with all of its identities.
    async fn find_by_external_identity(
        &self,
        ctx: &Context,
        provider: Provider,
        external_id: &str,
    ) -> Result<User>;
}

#[async_trait]
pub trait ExternalIdentityRepository: Send + Sync {
    /// Fails with `AlreadyExists` when the provider account is already linked.
    async fn add(&self, ctx: &Context, identity: &ExternalIdentity) -> Result<()>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create(&self, ctx: &Context, category: &Category) -> Result<()>;

    async fn has_any_for_user(&self, ctx: &Context, owner_id: Id) -> Result<bool>;

    /// Categories in creation order, so parents precede their children.
    async fn list_by_user_and_type(
        &self,
        ctx: &Context,
        owner_id: Id,
        category_type: CategoryType,
    ) -> Result<Vec<Category>>;
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn add(&self, ctx: &Context, transaction: &Transaction) -> Result<()>;

    /// Transactions of a user, oldest first.
    async fn list_by_user(&self, ctx: &Context, user_id: Id) -> Result<Vec<Transaction>>;
}
