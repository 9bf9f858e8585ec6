//! Repository implementations over [`SlotStore`].

use async_trait::async_trait;
use common::Id;
use domain::{Category, CategoryType, Context, ExternalIdentity, Provider, Transaction, User};

use crate::ports::{
    CategoryRepository, ExternalIdentityRepository, TransactionRepository, UserRepository,
};
use crate::{Result, StoreError};

use super::SlotStore;
use super::tables::{CategoryRow, IdentityRow, Tables, TransactionRow, UserRow, View};

pub(super) struct MemoryUserRepository {
    store: SlotStore,
}

impl MemoryUserRepository {
    pub fn new(store: SlotStore) -> Self {
        Self { store }
    }
}

fn restore_user(view: View<'_>, row: &UserRow) -> User {
    let identities = view
        .external_identities()
        .filter(|i| i.user_id == row.id)
        .map(IdentityRow::restore)
        .collect();
    User::restore(row.id, row.name.clone(), row.created_at, identities)
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, ctx: &Context, user: &User) -> Result<()> {
        ctx.run(self.store.write(Tables::user(UserRow::from(user))))
            .await?
    }

    async fn find_by_id(&self, ctx: &Context, id: Id) -> Result<User> {
        ctx.run(self.store.read(|view| {
            view.users()
                .find(|u| u.id == id)
                .map(|row| restore_user(view, row))
                .ok_or_else(|| StoreError::not_found("user", id))
        }))
        .await?
    }

    async fn lock_for_update(&self, ctx: &Context, id: Id) -> Result<()> {
        ctx.run(self.store.lock_user(id)).await?
    }

    async fn find_by_external_identity(
        &self,
        ctx: &Context,
        provider: Provider,
        external_id: &str,
    ) -> Result<User> {
        ctx.run(self.store.read(|view| {
            let user_id = view
                .external_identities()
                .find(|i| i.provider == provider && i.external_id == external_id)
                .map(|i| i.user_id);
            user_id
                .and_then(|id| view.users().find(|u| u.id == id))
                .map(|row| restore_user(view, row))
                .ok_or_else(|| {
                    StoreError::not_found("user", format!("{provider}:{external_id}"))
                })
        }))
        .await?
    }
}

pub(super) struct MemoryExternalIdentityRepository {
    store: SlotStore,
}

impl MemoryExternalIdentityRepository {
    pub fn new(store: SlotStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ExternalIdentityRepository for MemoryExternalIdentityRepository {
    async fn add(&self, ctx: &Context, identity: &ExternalIdentity) -> Result<()> {
        let rows = Tables::external_identity(IdentityRow::from(identity));
        ctx.run(self.store.write(rows)).await?
    }
}

pub(super) struct MemoryCategoryRepository {
    store: SlotStore,
}

impl MemoryCategoryRepository {
    pub fn new(store: SlotStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CategoryRepository for MemoryCategoryRepository {
    async fn create(&self, ctx: &Context, category: &Category) -> Result<()> {
        let rows = Tables::category(CategoryRow::from(category));
        ctx.run(self.store.write(rows)).await?
    }

    async fn has_any_for_user(&self, ctx: &Context, owner_id: Id) -> Result<bool> {
        let found = ctx
            .run(
                self.store
                    .read(|view| view.categories().any(|c| c.owner_id == owner_id)),
            )
            .await?;
        Ok(found)
    }

    async fn list_by_user_and_type(
        &self,
        ctx: &Context,
        owner_id: Id,
        category_type: CategoryType,
    ) -> Result<Vec<Category>> {
        let categories = ctx
            .run(self.store.read(|view| {
                view.categories()
                    .filter(|c| c.owner_id == owner_id && c.category_type == category_type)
                    .map(CategoryRow::restore)
                    .collect()
            }))
            .await?;
        Ok(categories)
    }
}

pub(super) struct MemoryTransactionRepository {
    store: SlotStore,
}

impl MemoryTransactionRepository {
    pub fn new(store: SlotStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TransactionRepository for MemoryTransactionRepository {
    async fn add(&self, ctx: &Context, transaction: &Transaction) -> Result<()> {
        let rows = Tables::transaction(TransactionRow::from(transaction));
        ctx.run(self.store.write(rows)).await?
    }

    async fn list_by_user(&self, ctx: &Context, user_id: Id) -> Result<Vec<Transaction>> {
        let transactions = ctx
            .run(self.store.read(|view| {
                view.transactions()
                    .filter(|t| t.user_id == user_id)
                    .map(TransactionRow::restore)
                    .collect()
            }))
            .await?;
        Ok(transactions)
    }
}
