//! Domain event contract.

use std::any::Any;
use std::fmt::Debug;

use common::Id;

/// Stable dispatch key carried by every domain event.
///
/// Subscriptions are keyed on this tag; adding a new event type means adding
/// a variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    UserCreated,
    ExternalIdentityAdded,
    TransactionRecorded,
}

impl EventKind {
    /// All kinds, in declaration order.
    pub const ALL: [EventKind; 3] = [
        EventKind::UserCreated,
        EventKind::ExternalIdentityAdded,
        EventKind::TransactionRecorded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::UserCreated => "UserCreated",
            EventKind::ExternalIdentityAdded => "ExternalIdentityAdded",
            EventKind::TransactionRecorded => "TransactionRecorded",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable fact raised by an aggregate.
///
/// Concrete events are plain structs; handlers that need typed access
/// downcast through [`DomainEvent::as_any`] or the [`downcast_event`] helper.
pub trait DomainEvent: Debug + Send + Sync + 'static {
    /// Unique id of this event occurrence.
    fn id(&self) -> Id;

    /// Dispatch key.
    fn kind(&self) -> EventKind;

    /// Event data as JSON, for consumers that do not know the concrete type.
    fn payload(&self) -> serde_json::Value;

    /// False for placeholder instances that must not be dispatched.
    fn is_valid(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any;
}

/// Typed view of a dynamically dispatched event.
pub fn downcast_event<E: DomainEvent>(event: &dyn DomainEvent) -> Option<&E> {
    event.as_any().downcast_ref::<E>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Pinged {
        id: Id,
    }

    impl DomainEvent for Pinged {
        fn id(&self) -> Id {
            self.id
        }

        fn kind(&self) -> EventKind {
            EventKind::UserCreated
        }

        fn payload(&self) -> serde_json::Value {
            serde_json::json!({ "id": self.id })
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Debug)]
    struct Other;

    impl DomainEvent for Other {
        fn id(&self) -> Id {
            Id::nil()
        }

        fn kind(&self) -> EventKind {
            EventKind::TransactionRecorded
        }

        fn payload(&self) -> serde_json::Value {
            serde_json::Value::Null
        }

        fn is_valid(&self) -> bool {
            false
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn kind_names_are_stable() {
        let names: Vec<&str> = EventKind::ALL.iter().map(EventKind::as_str).collect();
        assert_eq!(
            names,
            vec!["UserCreated", "ExternalIdentityAdded", "TransactionRecorded"]
        );
        assert_eq!(EventKind::UserCreated.to_string(), "UserCreated");
    }

    #[test]
    fn downcast_to_concrete_type() {
        let event = Pinged { id: Id::new() };
        let dynamic: &dyn DomainEvent = &event;
        assert_eq!(downcast_event::<Pinged>(dynamic).unwrap().id, event.id);
        assert!(downcast_event::<Other>(dynamic).is_none());
    }

    #[test]
    fn events_are_valid_unless_overridden() {
        assert!(Pinged { id: Id::new() }.is_valid());
        assert!(!Other.is_valid());
    }
}
