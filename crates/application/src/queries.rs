//! Read-side queries and the views they return.

use chrono::{DateTime, Utc};
use common::Id;
use domain::{Category, CategoryType, DomainError, Entity, ExternalIdentity, Provider, User};
use serde::Serialize;

use crate::commands::validate_external_id;

/// Finds the user linked to an external account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetUser {
    provider: Provider,
    external_id: String,
}

impl GetUser {
    pub fn new(provider: &str, external_id: &str) -> Result<Self, DomainError> {
        Ok(Self {
            provider: provider.parse()?,
            external_id: validate_external_id(external_id)?,
        })
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }
}

/// Lists a user's categories of one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetUserCategories {
    user_id: Id,
    category_type: CategoryType,
}

impl GetUserCategories {
    pub fn new(user_id: Id, category_type: &str) -> Result<Self, DomainError> {
        if user_id.is_zero() {
            return Err(DomainError::required("user_id"));
        }
        Ok(Self {
            user_id,
            category_type: category_type.parse()?,
        })
    }

    pub fn user_id(&self) -> Id {
        self.user_id
    }

    pub fn category_type(&self) -> CategoryType {
        self.category_type
    }
}

/// Outcome of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub user_id: Id,
    /// False when the account was already registered.
    pub created: bool,
}

/// Number of categories seeded for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DefaultCategoriesCreated {
    pub user_id: Id,
    pub parents: usize,
    pub children: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityView {
    pub id: Id,
    pub provider: Provider,
    pub external_id: String,
}

impl From<&ExternalIdentity> for IdentityView {
    fn from(identity: &ExternalIdentity) -> Self {
        Self {
            id: identity.id(),
            provider: identity.provider(),
            external_id: identity.external_id().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub id: Id,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub identities: Vec<IdentityView>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            name: user.name().to_string(),
            created_at: user.created_at(),
            identities: user
                .external_identities()
                .iter()
                .map(IdentityView::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryView {
    pub id: Id,
    pub name: String,
    pub parent_id: Option<Id>,
    pub category_type: CategoryType,
    pub created_at: DateTime<Utc>,
}

impl From<&Category> for CategoryView {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id(),
            name: category.name().to_string(),
            parent_id: category.parent_id(),
            category_type: category.category_type(),
            created_at: category.created_at(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_user_validates_account() {
        assert!(GetUser::new("telegram", "1001").is_ok());
        assert!(GetUser::new("telegram", "0").is_err());
        assert!(GetUser::new("icq", "1001").is_err());
    }

    #[test]
    fn get_user_categories_parses_type() {
        let user_id = Id::new();
        let query = GetUserCategories::new(user_id, "income").unwrap();
        assert_eq!(query.category_type(), CategoryType::Income);
        assert_eq!(query.user_id(), user_id);

        assert!(GetUserCategories::new(user_id, "savings").is_err());
        assert!(GetUserCategories::new(Id::nil(), "income").is_err());
    }

    #[test]
    fn user_view_lists_identities() {
        let user = User::register("Alice", Provider::Telegram, "1001").unwrap();
        let view = UserView::from(&user);

        assert_eq!(view.id, user.id());
        assert_eq!(view.identities.len(), 1);
        assert_eq!(view.identities[0].external_id, "1001");

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["identities"][0]["provider"], "telegram");
    }
}
