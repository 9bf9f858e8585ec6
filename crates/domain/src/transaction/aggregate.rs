//! Transaction aggregate.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use common::Id;
use serde::{Deserialize, Serialize};

use crate::aggregate::{AggregateRoot, BaseAggregate};
use crate::entity::Entity;
use crate::error::{DomainError, Result};

use super::{Amount, TransactionRecorded};

/// Direction of a money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(DomainError::invalid(
                "transaction_type",
                format!("unknown transaction type '{other}'"),
            )),
        }
    }
}

/// A recorded income or expense.
#[derive(Debug)]
pub struct Transaction {
    base: BaseAggregate,
    user_id: Id,
    category_id: Id,
    amount: Amount,
    transaction_type: TransactionType,
    created_at: DateTime<Utc>,
}

impl Transaction {
    /// Records a new transaction and raises [`TransactionRecorded`].
    pub fn new(
        user_id: Id,
        category_id: Id,
        amount: Amount,
        transaction_type: TransactionType,
    ) -> Result<Self> {
        if user_id.is_zero() {
            return Err(DomainError::required("user_id"));
        }
        if category_id.is_zero() {
            return Err(DomainError::required("category_id"));
        }

        let mut transaction = Self {
            base: BaseAggregate::new(Id::new()),
            user_id,
            category_id,
            amount,
            transaction_type,
            created_at: Utc::now(),
        };
        let event = TransactionRecorded::new(&transaction);
        transaction.base.raise_event(event);
        Ok(transaction)
    }

    pub fn restore(
        id: Id,
        user_id: Id,
        category_id: Id,
        amount: Amount,
        transaction_type: TransactionType,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            base: BaseAggregate::new(id),
            user_id,
            category_id,
            amount,
            transaction_type,
            created_at,
        }
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

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for Transaction {
    fn id(&self) -> Id {
        self.base.id()
    }
}

impl AggregateRoot for Transaction {
    fn base(&self) -> &BaseAggregate {
        &self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventKind, downcast_event};

    fn amount() -> Amount {
        Amount::parse("10,00").unwrap()
    }

    #[test]
    fn new_transaction_raises_recorded_event() {
        let user = Id::new();
        let category = Id::new();
        let tx = Transaction::new(user, category, amount(), TransactionType::Expense).unwrap();

        let events = tx.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), EventKind::TransactionRecorded);
        let recorded = downcast_event::<TransactionRecorded>(events[0].as_ref()).unwrap();
        assert_eq!(recorded.transaction_id, tx.id());
        assert_eq!(recorded.user_id, user);
        assert_eq!(recorded.amount, amount());
    }

    #[test]
    fn zero_ids_are_rejected() {
        let err = Transaction::new(Id::nil(), Id::new(), amount(), TransactionType::Income)
            .unwrap_err();
        assert_eq!(err, DomainError::required("user_id"));

        let err = Transaction::new(Id::new(), Id::nil(), amount(), TransactionType::Income)
            .unwrap_err();
        assert_eq!(err, DomainError::required("category_id"));
    }

    #[test]
    fn restore_raises_nothing() {
        let tx = Transaction::restore(
            Id::new(),
            Id::new(),
            Id::new(),
            amount(),
            TransactionType::Income,
            Utc::now(),
        );
        assert!(tx.events().is_empty());
    }

    #[test]
    fn transaction_type_parses() {
        assert_eq!(
            "expense".parse::<TransactionType>().unwrap(),
            TransactionType::Expense
        );
        assert!("transfer".parse::<TransactionType>().is_err());
    }
}
