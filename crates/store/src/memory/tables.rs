//! Row storage and constraint checks for the in-memory backend.

use chrono::{DateTime, Utc};
use common::Id;
use domain::{
    Amount, Category, CategoryType, Entity, ExternalIdentity, Provider, Transaction,
    TransactionType, User,
};

use super::RowCounts;

#[derive(Debug, Clone)]
pub(super) struct UserRow {
    pub id: Id,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub(super) struct IdentityRow {
    pub id: Id,
    pub user_id: Id,
    pub provider: Provider,
    pub external_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub(super) struct CategoryRow {
    pub id: Id,
    pub name: String,
    pub owner_id: Id,
    pub parent_id: Option<Id>,
    pub category_type: CategoryType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub(super) struct TransactionRow {
    pub id: Id,
    pub user_id: Id,
    pub category_id: Id,
    pub amount: Amount,
    pub transaction_type: TransactionType,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            name: user.name().to_string(),
            created_at: user.created_at(),
        }
    }
}

impl From<&ExternalIdentity> for IdentityRow {
    fn from(identity: &ExternalIdentity) -> Self {
        Self {
            id: identity.id(),
            user_id: identity.user_id(),
            provider: identity.provider(),
            external_id: identity.external_id().to_string(),
            created_at: identity.created_at(),
        }
    }
}

impl From<&Category> for CategoryRow {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id(),
            name: category.name().to_string(),
            owner_id: category.owner_id(),
            parent_id: category.parent_id(),
            category_type: category.category_type(),
            created_at: category.created_at(),
        }
    }
}

impl From<&Transaction> for TransactionRow {
    fn from(transaction: &Transaction) -> Self {
        Self {
            id: transaction.id(),
            user_id: transaction.user_id(),
            category_id: transaction.category_id(),
            amount: transaction.amount(),
            transaction_type: transaction.transaction_type(),
            created_at: transaction.created_at(),
        }
    }
}

impl IdentityRow {
    pub fn restore(&self) -> ExternalIdentity {
        ExternalIdentity::restore(
            self.id,
            self.user_id,
            self.provider,
            self.external_id.clone(),
            self.created_at,
        )
    }
}

impl CategoryRow {
    pub fn restore(&self) -> Category {
        Category::restore(
            self.id,
            self.name.clone(),
            self.owner_id,
            self.parent_id,
            self.category_type,
            self.created_at,
        )
    }
}

impl TransactionRow {
    pub fn restore(&self) -> Transaction {
        Transaction::restore(
            self.id,
            self.user_id,
            self.category_id,
            self.amount,
            self.transaction_type,
            self.created_at,
        )
    }
}

/// A constraint the rows would break.
#[derive(Debug)]
pub(super) enum Conflict {
    Duplicate {
        entity: &'static str,
        field: &'static str,
        value: String,
    },
    MissingReference {
        entity: &'static str,
        key: String,
    },
}

/// Rows in insertion order.
#[derive(Debug, Default)]
pub(super) struct Tables {
    pub users: Vec<UserRow>,
    pub external_identities: Vec<IdentityRow>,
    pub categories: Vec<CategoryRow>,
    pub transactions: Vec<TransactionRow>,
}

impl Tables {
    pub fn user(row: UserRow) -> Self {
        Self {
            users: vec![row],
            ..Self::default()
        }
    }

    pub fn external_identity(row: IdentityRow) -> Self {
        Self {
            external_identities: vec![row],
            ..Self::default()
        }
    }

    pub fn category(row: CategoryRow) -> Self {
        Self {
            categories: vec![row],
            ..Self::default()
        }
    }

    pub fn transaction(row: TransactionRow) -> Self {
        Self {
            transactions: vec![row],
            ..Self::default()
        }
    }

    pub fn apply(&mut self, rows: Tables) {
        self.users.extend(rows.users);
        self.external_identities.extend(rows.external_identities);
        self.categories.extend(rows.categories);
        self.transactions.extend(rows.transactions);
    }

    pub fn check_insertable(&self, rows: &Tables) -> Result<(), Conflict> {
        View::new(self, None).check_insertable(rows)
    }

    pub fn counts(&self) -> RowCounts {
        RowCounts {
            users: self.users.len(),
            external_identities: self.external_identities.len(),
            categories: self.categories.len(),
            transactions: self.transactions.len(),
        }
    }
}

/// Committed rows overlaid with one transaction's pending rows.
#[derive(Clone, Copy)]
pub(super) struct View<'a> {
    committed: &'a Tables,
    pending: Option<&'a Tables>,
}

impl<'a> View<'a> {
    pub fn new(committed: &'a Tables, pending: Option<&'a Tables>) -> Self {
        Self { committed, pending }
    }

    fn layers(self) -> impl Iterator<Item = &'a Tables> {
        std::iter::once(self.committed).chain(self.pending)
    }

    pub fn users(self) -> impl Iterator<Item = &'a UserRow> {
        self.layers().flat_map(|t| t.users.iter())
    }

    pub fn external_identities(self) -> impl Iterator<Item = &'a IdentityRow> {
        self.layers().flat_map(|t| t.external_identities.iter())
    }

    pub fn categories(self) -> impl Iterator<Item = &'a CategoryRow> {
        self.layers().flat_map(|t| t.categories.iter())
    }

    pub fn transactions(self) -> impl Iterator<Item = &'a TransactionRow> {
        self.layers().flat_map(|t| t.transactions.iter())
    }

    /// Mirrors the primary, unique, and foreign keys of the SQL schema.
    pub fn check_insertable(self, rows: &Tables) -> Result<(), Conflict> {
        let user_exists =
            |id: Id| self.users().any(|u| u.id == id) || rows.users.iter().any(|u| u.id == id);
        let category_exists = |id: Id| {
            self.categories().any(|c| c.id == id) || rows.categories.iter().any(|c| c.id == id)
        };

        for user in &rows.users {
            if self.users().any(|u| u.id == user.id) {
                return Err(Conflict::Duplicate {
                    entity: "user",
                    field: "id",
                    value: user.id.to_string(),
                });
            }
        }

        for identity in &rows.external_identities {
            if self
                .external_identities()
                .any(|i| i.provider == identity.provider && i.external_id == identity.external_id)
            {
                return Err(Conflict::Duplicate {
                    entity: "external identity",
                    field: "external_id",
                    value: identity.external_id.clone(),
                });
            }
            if !user_exists(identity.user_id) {
                return Err(missing("user", identity.user_id));
            }
        }

        for category in &rows.categories {
            if !user_exists(category.owner_id) {
                return Err(missing("user", category.owner_id));
            }
            if let Some(parent) = category.parent_id
                && !category_exists(parent)
            {
                return Err(missing("category", parent));
            }
        }

        for transaction in &rows.transactions {
            if !user_exists(transaction.user_id) {
                return Err(missing("user", transaction.user_id));
            }
            if !category_exists(transaction.category_id) {
                return Err(missing("category", transaction.category_id));
            }
        }

        Ok(())
    }
}

fn missing(entity: &'static str, key: Id) -> Conflict {
    Conflict::MissingReference {
        entity,
        key: key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_row() -> UserRow {
        UserRow {
            id: Id::new(),
            name: "Alice".into(),
            created_at: Utc::now(),
        }
    }

    fn identity_row(user_id: Id, external_id: &str) -> IdentityRow {
        IdentityRow {
            id: Id::new(),
            user_id,
            provider: Provider::Telegram,
            external_id: external_id.into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn pending_rows_are_visible_through_the_view() {
        let committed = Tables::default();
        let pending = Tables::user(user_row());

        assert_eq!(View::new(&committed, Some(&pending)).users().count(), 1);
        assert_eq!(View::new(&committed, None).users().count(), 0);
    }

    #[test]
    fn duplicate_provider_account_conflicts() {
        let mut committed = Tables::default();
        let user = user_row();
        let user_id = user.id;
        committed.apply(Tables::user(user));
        committed.apply(Tables::external_identity(identity_row(user_id, "1001")));

        let again = Tables::external_identity(identity_row(user_id, "1001"));
        assert!(matches!(
            committed.check_insertable(&again),
            Err(Conflict::Duplicate { field: "external_id", .. })
        ));
    }

    #[test]
    fn identity_needs_its_user() {
        let committed = Tables::default();
        let orphan = Tables::external_identity(identity_row(Id::new(), "1001"));
        assert!(matches!(
            committed.check_insertable(&orphan),
            Err(Conflict::MissingReference { entity: "user", .. })
        ));
    }

    #[test]
    fn counts_follow_applied_rows() {
        let mut tables = Tables::default();
        let user = user_row();
        let user_id = user.id;
        tables.apply(Tables::user(user));
        tables.apply(Tables::external_identity(identity_row(user_id, "1")));

        let counts = tables.counts();
        assert_eq!(counts.users, 1);
        assert_eq!(counts.external_identities, 1);
        assert_eq!(counts.categories, 0);
    }
}
