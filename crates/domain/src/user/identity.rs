//! Links between a user and an external messaging account.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use common::Id;
use serde::{Deserialize, Serialize};

use crate::entity::{BaseEntity, Entity};
use crate::error::{DomainError, Result};

/// External account provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Telegram,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Telegram => "telegram",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "telegram" => Ok(Provider::Telegram),
            other => Err(DomainError::invalid(
                "provider",
                format!("unknown provider '{other}'"),
            )),
        }
    }
}

/// An account on an external provider owned by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    entity: BaseEntity,
    user_id: Id,
    provider: Provider,
    external_id: String,
    created_at: DateTime<Utc>,
}

impl ExternalIdentity {
    /// Creates a new identity for `user_id`.
    ///
    /// Fails when the user id is zero or the external id is blank.
    pub fn new(user_id: Id, provider: Provider, external_id: impl Into<String>) -> Result<Self> {
        let external_id = external_id.into();
        if user_id.is_zero() {
            return Err(DomainError::required("user_id"));
        }
        if external_id.trim().is_empty() {
            return Err(DomainError::required("external_id"));
        }

        Ok(Self {
            entity: BaseEntity::new(Id::new()),
            user_id,
            provider,
            external_id,
            created_at: Utc::now(),
        })
    }

    /// Rebuilds a persisted identity.
    pub fn restore(
        id: Id,
        user_id: Id,
        provider: Provider,
        external_id: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            entity: BaseEntity::new(id),
            user_id,
            provider,
            external_id,
            created_at,
        }
    }

    pub fn user_id(&self) -> Id {
        self.user_id
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for ExternalIdentity {
    fn id(&self) -> Id {
        self.entity.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parses_known_tags() {
        assert_eq!("telegram".parse::<Provider>().unwrap(), Provider::Telegram);
        assert_eq!(Provider::Telegram.to_string(), "telegram");
    }

    #[test]
    fn provider_rejects_unknown_tags() {
        let err = "icq".parse::<Provider>().unwrap_err();
        assert!(matches!(err, DomainError::ValueInvalid { field: "provider", .. }));
    }

    #[test]
    fn provider_serializes_lowercase() {
        let json = serde_json::to_string(&Provider::Telegram).unwrap();
        assert_eq!(json, "\"telegram\"");
    }

    #[test]
    fn new_identity_keeps_its_fields() {
        let user_id = Id::new();
        let identity = ExternalIdentity::new(user_id, Provider::Telegram, "42").unwrap();

        assert_eq!(identity.user_id(), user_id);
        assert_eq!(identity.provider(), Provider::Telegram);
        assert_eq!(identity.external_id(), "42");
        assert!(!identity.id().is_zero());
    }

    #[test]
    fn blank_external_id_is_rejected() {
        let err = ExternalIdentity::new(Id::new(), Provider::Telegram, "  ").unwrap_err();
        assert_eq!(err, DomainError::required("external_id"));
    }

    #[test]
    fn zero_user_id_is_rejected() {
        let err = ExternalIdentity::new(Id::nil(), Provider::Telegram, "42").unwrap_err();
        assert_eq!(err, DomainError::required("user_id"));
    }
}
