//! Aggregate base type and its domain-event buffer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use common::Id;

use crate::entity::{BaseEntity, Entity};
use crate::event::DomainEvent;

/// Ordered buffer of events raised by one aggregate.
///
/// Cloning yields another handle on the same buffer; the unit of work keeps
/// such a handle for every tracked aggregate and drains it at commit. The lock
/// exists for that hand-off only, aggregates are still mutated by a single
/// request at a time.
#[derive(Debug, Clone, Default)]
pub struct EventBuffer(Arc<Mutex<Vec<Arc<dyn DomainEvent>>>>);

impl EventBuffer {
    fn lock(&self) -> MutexGuard<'_, Vec<Arc<dyn DomainEvent>>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, event: Arc<dyn DomainEvent>) {
        self.lock().push(event);
    }

    /// Copy of the current contents, in raise order.
    pub fn snapshot(&self) -> Vec<Arc<dyn DomainEvent>> {
        self.lock().clone()
    }

    /// Removes and returns every buffered event, in raise order.
    pub fn take(&self) -> Vec<Arc<dyn DomainEvent>> {
        std::mem::take(&mut *self.lock())
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// True when both handles point at the same buffer.
    pub fn same_buffer(&self, other: &EventBuffer) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Identity plus event buffer, embedded by every aggregate.
#[derive(Debug)]
pub struct BaseAggregate {
    entity: BaseEntity,
    events: EventBuffer,
}

impl BaseAggregate {
    pub fn new(id: Id) -> Self {
        Self {
            entity: BaseEntity::new(id),
            events: EventBuffer::default(),
        }
    }

    pub fn id(&self) -> Id {
        self.entity.id()
    }

    /// Appends an event to the buffer.
    pub fn raise_event(&mut self, event: impl DomainEvent) {
        self.events.push(Arc::new(event));
    }

    /// Events raised since the last clear, in raise order.
    pub fn events(&self) -> Vec<Arc<dyn DomainEvent>> {
        self.events.snapshot()
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Shared handle on this aggregate's buffer.
    pub fn event_buffer(&self) -> EventBuffer {
        self.events.clone()
    }
}

impl Entity for BaseAggregate {
    fn id(&self) -> Id {
        self.entity.id()
    }
}

/// A consistency boundary that records domain events as its state changes.
pub trait AggregateRoot: Entity + Send + Sync {
    fn base(&self) -> &BaseAggregate;

    fn events(&self) -> Vec<Arc<dyn DomainEvent>> {
        self.base().events()
    }

    fn event_buffer(&self) -> EventBuffer {
        self.base().event_buffer()
    }
}
