use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error returned when a string is not a valid identifier.
#[derive(Debug, Error)]
#[error("invalid id format: {0}")]
pub struct IdFormatError(#[from] uuid::Error);

/// Unique, time-ordered identifier shared by every entity and aggregate.
///
/// New values are UUIDv7, so ids generated later sort after ids generated
/// earlier. The nil UUID is the "unset" sentinel and is what `Default` yields.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new time-ordered id.
    ///
    /// Falls back to a random UUIDv4 when the system clock cannot provide a
    /// timestamp for the ordered generator.
    pub fn new() -> Self {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(_) => Self(Uuid::now_v7()),
            Err(_) => Self(Uuid::new_v4()),
        }
    }

    /// Returns the zero id.
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Parses an id from its textual UUID form.
    pub fn parse(s: &str) -> Result<Self, IdFormatError> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Creates an id from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Returns true only for the unset (nil) id.
    pub fn is_zero(&self) -> bool {
        self.0.is_nil()
    }
}

impl FromStr for Id {
    type Err = IdFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for Id {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<Id> for Uuid {
    fn from(id: Id) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_unique_ids() {
        let id1 = Id::new();
        let id2 = Id::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn new_ids_are_time_ordered() {
        let ids: Vec<Id> = (0..64).map(|_| Id::new()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn new_ids_use_version_7() {
        assert_eq!(Id::new().as_uuid().get_version_num(), 7);
    }

    #[test]
    fn default_is_zero() {
        assert!(Id::default().is_zero());
        assert!(Id::nil().is_zero());
        assert!(!Id::new().is_zero());
    }

    #[test]
    fn parse_accepts_uuid_text() {
        let id = Id::new();
        let parsed: Id = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert!(Id::parse("not-a-uuid").is_err());
        assert!(Id::parse("").is_err());
        let err = Id::parse("1234").unwrap_err();
        assert!(err.to_string().starts_with("invalid id format"));
    }

    #[test]
    fn serializes_as_plain_uuid_string() {
        let id = Id::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: Id = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
