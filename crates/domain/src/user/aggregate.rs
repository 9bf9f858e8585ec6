//! User aggregate.

use chrono::{DateTime, Utc};
use common::Id;

use crate::aggregate::{AggregateRoot, BaseAggregate};
use crate::entity::Entity;
use crate::error::{DomainError, Result};

use super::{ExternalIdentity, ExternalIdentityAdded, Provider, UserCreated};

/// A person using the bot.
///
/// Owns the external identities that map messaging accounts onto it; at most
/// one identity per provider.
#[derive(Debug)]
pub struct User {
    base: BaseAggregate,
    name: String,
    created_at: DateTime<Utc>,
    identities: Vec<ExternalIdentity>,
}

impl User {
    /// Creates a user and raises [`UserCreated`].
    ///
    /// The name is trimmed and must not be blank.
    pub fn new(name: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::required("name"));
        }

        let mut user = Self {
            base: BaseAggregate::new(Id::new()),
            name: name.to_string(),
            created_at: Utc::now(),
            identities: Vec::new(),
        };
        let event = UserCreated::new(user.id(), &user.name);
        user.base.raise_event(event);
        Ok(user)
    }

    /// Creates a user already linked to `provider`/`external_id`.
    pub fn register(name: &str, provider: Provider, external_id: &str) -> Result<Self> {
        let mut user = Self::new(name)?;
        let identity = ExternalIdentity::new(user.id(), provider, external_id)?;
        user.add_external_identity(identity)?;
        Ok(user)
    }

    /// Rebuilds a persisted user. No events are raised.
    pub fn restore(
        id: Id,
        name: String,
        created_at: DateTime<Utc>,
        identities: Vec<ExternalIdentity>,
    ) -> Self {
        Self {
            base: BaseAggregate::new(id),
            name,
            created_at,
            identities,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn external_identities(&self) -> &[ExternalIdentity] {
        &self.identities
    }

    pub fn external_identity(&self, provider: Provider) -> Option<&ExternalIdentity> {
        self.identities.iter().find(|i| i.provider() == provider)
    }

    /// Links an external account and raises [`ExternalIdentityAdded`].
    pub fn add_external_identity(&mut self, identity: ExternalIdentity) -> Result<()> {
        if identity.user_id() != self.id() {
            return Err(DomainError::invalid(
                "external_identity",
                "belongs to another user",
            ));
        }
        if self.external_identity(identity.provider()).is_some() {
            return Err(DomainError::invalid(
                "external_identity",
                format!("{} account already linked", identity.provider()),
            ));
        }

        let event = ExternalIdentityAdded::new(&identity, &self.name);
        self.identities.push(identity);
        self.base.raise_event(event);
        Ok(())
    }
}

impl Entity for User {
    fn id(&self) -> Id {
        self.base.id()
    }
}

impl AggregateRoot for User {
    fn base(&self) -> &BaseAggregate {
        &self.base
    }
}
