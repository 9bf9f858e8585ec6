//! Write-side commands.
//!
//! Constructors validate their input, so a command that exists is well
//! formed and handlers can open a transaction without re-checking it.

use common::Id;
use domain::{Amount, DomainError, Provider, TransactionType};

/// Rejects blank ids and the `"0"` placeholder some chat clients send for
/// unknown senders.
pub(crate) fn validate_external_id(external_id: &str) -> Result<String, DomainError> {
    let external_id = external_id.trim();
    if external_id.is_empty() {
        return Err(DomainError::required("external_id"));
    }
    if external_id == "0" {
        return Err(DomainError::invalid("external_id", "must not be 0"));
    }
    Ok(external_id.to_string())
}

/// Signs up a person through an external account. Idempotent per account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterUser {
    name: String,
    provider: Provider,
    external_id: String,
}

impl RegisterUser {
    pub fn new(name: &str, provider: &str, external_id: &str) -> Result<Self, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::required("name"));
        }

        Ok(Self {
            name: name.to_string(),
            provider: provider.parse()?,
            external_id: validate_external_id(external_id)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }
}

/// Seeds the default category tree for the user behind an external account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDefaultCategories {
    provider: Provider,
    external_id: String,
}

impl CreateDefaultCategories {
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

/// Records one income or expense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTransaction {
    user_id: Id,
    category_id: Id,
    amount: Amount,
    transaction_type: TransactionType,
}

impl RecordTransaction {
    /// `amount` is a decimal string such as `"12.50"` or `"12,5"`.
    pub fn new(
        user_id: Id,
        category_id: Id,
        amount: &str,
        transaction_type: &str,
    ) -> Result<Self, DomainError> {
        if user_id.is_zero() {
            return Err(DomainError::required("user_id"));
        }
        if category_id.is_zero() {
            return Err(DomainError::required("category_id"));
        }

        Ok(Self {
            user_id,
            category_id,
            amount: Amount::parse(amount)?,
            transaction_type: transaction_type.parse()?,
        })
    }

    pub fn user_id(&self) -> Id {
        self.user_id
    }

    pub fn category_id(&self) -> Id {
        self.category_id
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_user_trims_and_parses() {
        let command = RegisterUser::new("  Alice  ", "telegram", " 1001 ").unwrap();
        assert_eq!(command.name(), "Alice");
        assert_eq!(command.provider(), Provider::Telegram);
        assert_eq!(command.external_id(), "1001");
    }

    #[test]
    fn register_user_rejects_blank_name() {
        let err = RegisterUser::new("   ", "telegram", "1001").unwrap_err();
        assert_eq!(err, DomainError::required("name"));
    }

    #[test]
    fn external_id_must_be_present_and_not_zero() {
        assert_eq!(
            RegisterUser::new("Alice", "telegram", "").unwrap_err(),
            DomainError::required("external_id")
        );
        assert!(matches!(
            RegisterUser::new("Alice", "telegram", "0").unwrap_err(),
            DomainError::ValueInvalid { field: "external_id", .. }
        ));
        assert!(CreateDefaultCategories::new("telegram", "0").is_err());
    }

    #[test]
    fn unknown_provider_is_rejected() {
        assert!(RegisterUser::new("Alice", "myspace", "1001").is_err());
        assert!(CreateDefaultCategories::new("myspace", "1001").is_err());
    }

    #[test]
    fn record_transaction_parses_amount_and_type() {
        let user_id = Id::new();
        let category_id = Id::new();
        let command = RecordTransaction::new(user_id, category_id, "12,5", "expense").unwrap();

        assert_eq!(command.amount().minor_units(), 1250);
        assert_eq!(command.transaction_type(), TransactionType::Expense);
        assert_eq!(command.user_id(), user_id);
        assert_eq!(command.category_id(), category_id);
    }

    #[test]
    fn record_transaction_rejects_bad_input() {
        let id = Id::new();
        assert!(RecordTransaction::new(Id::nil(), id, "1", "income").is_err());
        assert!(RecordTransaction::new(id, Id::nil(), "1", "income").is_err());
        assert!(RecordTransaction::new(id, id, "0", "income").is_err());
        assert!(RecordTransaction::new(id, id, "1.234", "income").is_err());
        assert!(RecordTransaction::new(id, id, "1", "refund").is_err());
    }
}
