//! Events raised by the transaction aggregate.

use std::any::Any;

use chrono::{DateTime, Utc};
use common::Id;

use crate::entity::Entity;
use crate::event::{DomainEvent, EventKind};

use super::{Amount, Transaction, TransactionType};

/// A transaction was recorded.
#[derive(Debug, Clone)]
pub struct TransactionRecorded {
    pub id: Id,
    pub transaction_id: Id,
    pub user_id: Id,
    pub category_id: Id,
    pub amount: Amount,
    pub transaction_type: TransactionType,
    pub occurred_at: DateTime<Utc>,
}

impl TransactionRecorded {
    pub fn new(transaction: &Transaction) -> Self {
        Self {
            id: Id::new(),
            transaction_id: transaction.id(),
            user_id: transaction.user_id(),
            category_id: transaction.category_id(),
            amount: transaction.amount(),
            transaction_type: transaction.transaction_type(),
            occurred_at: transaction.created_at(),
        }
    }
}

impl DomainEvent for TransactionRecorded {
    fn id(&self) -> Id {
        self.id
    }

    fn kind(&self) -> EventKind {
        EventKind::TransactionRecorded
    }

    fn payload(&self) -> serde_json::Value {
        serde_json::json!({
            "transaction_id": self.transaction_id,
            "user_id": self.user_id,
            "category_id": self.category_id,
            "amount": self.amount,
            "amount_minor": self.amount.minor_units(),
            "transaction_type": self.transaction_type,
            "occurred_at": self.occurred_at,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
