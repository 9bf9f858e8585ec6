//! Category aggregate.
//!
//! Categories form a two-level tree per user: parents with
//! `parent_id == None` and children pointing at a parent of the same owner.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use common::Id;
use serde::{Deserialize, Serialize};

use crate::aggregate::{AggregateRoot, BaseAggregate};
use crate::entity::Entity;
use crate::error::{DomainError, Result};

/// Longest accepted category name, in characters.
pub const MAX_NAME_LEN: usize = 100;

/// Whether a category groups income or expenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Income,
    Expense,
}

impl CategoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Income => "income",
            CategoryType::Expense => "expense",
        }
    }
}

impl std::fmt::Display for CategoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "income" => Ok(CategoryType::Income),
            "expense" => Ok(CategoryType::Expense),
            other => Err(DomainError::invalid(
                "category_type",
                format!("unknown category type '{other}'"),
            )),
        }
    }
}

#[derive(Debug)]
pub struct Category {
    base: BaseAggregate,
    name: String,
    owner_id: Id,
    parent_id: Option<Id>,
    category_type: CategoryType,
    created_at: DateTime<Utc>,
}

impl Category {
    /// Creates a category owned by `owner_id`.
    ///
    /// A zero `parent_id` is treated as no parent.
    pub fn new(
        name: &str,
        owner_id: Id,
        parent_id: Option<Id>,
        category_type: CategoryType,
    ) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::required("name"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(DomainError::invalid(
                "name",
                format!("longer than {MAX_NAME_LEN} characters"),
            ));
        }
        if owner_id.is_zero() {
            return Err(DomainError::required("owner_id"));
        }

        Ok(Self {
            base: BaseAggregate::new(Id::new()),
            name: name.to_string(),
            owner_id,
            parent_id: parent_id.filter(|id| !id.is_zero()),
            category_type,
            created_at: Utc::now(),
        })
    }

    pub fn restore(
        id: Id,
        name: String,
        owner_id: Id,
        parent_id: Option<Id>,
        category_type: CategoryType,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            base: BaseAggregate::new(id),
            name,
            owner_id,
            parent_id,
            category_type,
            created_at,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner_id(&self) -> Id {
        self.owner_id
    }

    pub fn parent_id(&self) -> Option<Id> {
        self.parent_id
    }

    pub fn category_type(&self) -> CategoryType {
        self.category_type
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

impl Entity for Category {
    fn id(&self) -> Id {
        self.base.id()
    }
}

impl AggregateRoot for Category {
    fn base(&self) -> &BaseAggregate {
        &self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_category_trims_name() {
        let owner = Id::new();
        let category = Category::new("  Food ", owner, None, CategoryType::Expense).unwrap();

        assert_eq!(category.name(), "Food");
        assert_eq!(category.owner_id(), owner);
        assert!(category.is_root());
        assert!(category.events().is_empty());
    }

    #[test]
    fn zero_parent_means_root() {
        let category =
            Category::new("Food", Id::new(), Some(Id::nil()), CategoryType::Expense).unwrap();
        assert!(category.parent_id().is_none());
    }

    #[test]
    fn child_keeps_parent() {
        let parent = Id::new();
        let category =
            Category::new("Cafe", Id::new(), Some(parent), CategoryType::Expense).unwrap();
        assert_eq!(category.parent_id(), Some(parent));
        assert!(!category.is_root());
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = Category::new(" ", Id::new(), None, CategoryType::Income).unwrap_err();
        assert_eq!(err, DomainError::required("name"));
    }

    #[test]
    fn name_length_is_counted_in_characters() {
        let at_limit = "й".repeat(MAX_NAME_LEN);
        assert!(Category::new(&at_limit, Id::new(), None, CategoryType::Income).is_ok());

        let too_long = "a".repeat(MAX_NAME_LEN + 1);
        let err = Category::new(&too_long, Id::new(), None, CategoryType::Income).unwrap_err();
        assert!(matches!(err, DomainError::ValueInvalid { field: "name", .. }));
    }

    #[test]
    fn zero_owner_is_rejected() {
        let err = Category::new("Food", Id::nil(), None, CategoryType::Expense).unwrap_err();
        assert_eq!(err, DomainError::required("owner_id"));
    }

    #[test]
    fn category_type_round_trips_through_strings() {
        for ty in [CategoryType::Income, CategoryType::Expense] {
            assert_eq!(ty.as_str().parse::<CategoryType>().unwrap(), ty);
        }
        assert!("savings".parse::<CategoryType>().is_err());
    }
}
