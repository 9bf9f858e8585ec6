//! Base entity shared by every domain object.

use common::Id;

/// Identity holder embedded in every entity.
///
/// The id is fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BaseEntity {
    id: Id,
}

impl BaseEntity {
    pub fn new(id: Id) -> Self {
        Self { id }
    }

    pub fn id(&self) -> Id {
        self.id
    }
}

/// Anything with a stable identity.
pub trait Entity {
    fn id(&self) -> Id;

    /// Identity comparison. An absent `other` never matches.
    fn equal(&self, other: Option<&Self>) -> bool {
        other.is_some_and(|other| self.id() == other.id())
    }
}

impl Entity for BaseEntity {
    fn id(&self) -> Id {
        self.id
    }
}
