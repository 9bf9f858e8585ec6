//! Events raised by the user aggregate.

use std::any::Any;

use chrono::{DateTime, Utc};
use common::Id;

use crate::entity::Entity;
use crate::event::{DomainEvent, EventKind};

use super::{ExternalIdentity, Provider};

/// A user was registered.
#[derive(Debug, Clone)]
pub struct UserCreated {
    pub id: Id,
    pub user_id: Id,
    pub name: String,
    pub occurred_at: DateTime<Utc>,
}

impl UserCreated {
    pub fn new(user_id: Id, name: impl Into<String>) -> Self {
        Self {
            id: Id::new(),
            user_id,
            name: name.into(),
            occurred_at: Utc::now(),
        }
    }
}

impl DomainEvent for UserCreated {
    fn id(&self) -> Id {
        self.id
    }

    fn kind(&self) -> EventKind {
        EventKind::UserCreated
    }

    fn payload(&self) -> serde_json::Value {
        serde_json::json!({
            "user_id": self.user_id,
            "name": self.name,
            "occurred_at": self.occurred_at,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// An external account was linked to a user.
///
/// Carries the user's name so greeting handlers need no extra lookup.
#[derive(Debug, Clone)]
pub struct ExternalIdentityAdded {
    pub id: Id,
    pub identity_id: Id,
    pub user_id: Id,
    pub user_name: String,
    pub provider: Provider,
    pub external_id: String,
    pub occurred_at: DateTime<Utc>,
}

impl ExternalIdentityAdded {
    pub fn new(identity: &ExternalIdentity, user_name: impl Into<String>) -> Self {
        Self {
            id: Id::new(),
            identity_id: identity.id(),
            user_id: identity.user_id(),
            user_name: user_name.into(),
            provider: identity.provider(),
            external_id: identity.external_id().to_string(),
            occurred_at: Utc::now(),
        }
    }
}

impl DomainEvent for ExternalIdentityAdded {
    fn id(&self) -> Id {
        self.id
    }

    fn kind(&self) -> EventKind {
        EventKind::ExternalIdentityAdded
    }

    fn payload(&self) -> serde_json::Value {
        serde_json::json!({
            "identity_id": self.identity_id,
            "user_id": self.user_id,
            "user_name": self.user_name,
            "provider": self.provider,
            "external_id": self.external_id,
            "occurred_at": self.occurred_at,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
