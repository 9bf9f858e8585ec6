//! Category tree seeded for new users.

use domain::CategoryType;

/// A root category and the names of its children.
#[derive(Debug, Clone, Copy)]
pub struct DefaultCategory {
    pub name: &'static str,
    pub category_type: CategoryType,
    pub children: &'static [&'static str],
}

const fn expense(name: &'static str, children: &'static [&'static str]) -> DefaultCategory {
    DefaultCategory {
        name,
        category_type: CategoryType::Expense,
        children,
    }
}

pub const DEFAULT_CATEGORIES: &[DefaultCategory] = &[
    expense(
        "Shopping",
        &["🍎 Food & groceries", "👕 Clothing", "🏡 Home & household", "💻 Electronics"],
    ),
    expense("Mandatory", &["🏠 Utilities", "📞 Phone", "💸 Taxes"]),
    expense("Health", &["🏥 Medicine", "🏋️ Sport", "💅 Beauty"]),
    expense("Transport", &["🚙 Car", "✈️ Trips"]),
    expense("Other", &["🔹 Other", "⚠️ Unplanned expenses"]),
    expense(
        "Entertainment",
        &["🎬 Cinema & theatre", "🌍 Travel", "☕ Cafe", "🎁 Souvenirs"],
    ),
    expense("Holidays", &["🎀 Gifts", "🎊 Celebrations"]),
    expense("Services", &["🔧 Services", "🌐 Internet"]),
    expense("Education", &["📚 Books", "🎓 Courses"]),
    DefaultCategory {
        name: "Income",
        category_type: CategoryType::Income,
        children: &["💼 Salary", "🛠️ Side jobs", "🏦 Interest"],
    },
];

/// Number of root categories in the default tree.
pub fn parent_count() -> usize {
    DEFAULT_CATEGORIES.len()
}

/// Number of child categories in the default tree.
pub fn child_count() -> usize {
    DEFAULT_CATEGORIES.iter().map(|c| c.children.len()).sum()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use domain::category::MAX_NAME_LEN;

    use super::*;

    #[test]
    fn tree_has_ten_parents_and_twenty_seven_children() {
        assert_eq!(parent_count(), 10);
        assert_eq!(child_count(), 27);
    }

    #[test]
    fn both_types_are_covered() {
        let types: HashSet<CategoryType> =
            DEFAULT_CATEGORIES.iter().map(|c| c.category_type).collect();
        assert!(types.contains(&CategoryType::Income));
        assert!(types.contains(&CategoryType::Expense));
    }

    #[test]
    fn names_fit_the_column() {
        for parent in DEFAULT_CATEGORIES {
            assert!(parent.name.chars().count() <= MAX_NAME_LEN);
            for child in parent.children {
                assert!(!child.trim().is_empty());
                assert!(child.chars().count() <= MAX_NAME_LEN);
            }
        }
    }
}
