//! In-process publish/subscribe dispatcher for domain events.
//!
//! Delivery is synchronous and best-effort: handlers run on the publishing
//! task, in registration order, and nothing is persisted or retried. The
//! subscription table is assembled once through [`MediatorBuilder`] and is
//! read-only afterwards, so a built [`Mediator`] can be shared behind an
//! `Arc` by every unit of work.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::context::Context;
use crate::error::ErrorKind;
use crate::event::{DomainEvent, EventKind};

/// Failure reported by a subscribed handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The handler ran and failed.
    #[error("event handler '{handler}' failed on {kind}: {message}")]
    Handler {
        handler: &'static str,
        kind: EventKind,
        message: String,
    },

    /// The handler received an event type it does not understand.
    #[error("event handler '{handler}' received unexpected event {kind}")]
    UnexpectedEvent {
        handler: &'static str,
        kind: EventKind,
    },
}

impl DispatchError {
    pub fn handler(handler: &'static str, kind: EventKind, message: impl std::fmt::Display) -> Self {
        DispatchError::Handler {
            handler,
            kind,
            message: message.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Dispatch
    }
}

/// Reacts to published domain events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &'static str;

    async fn handle(&self, ctx: &Context, event: &dyn DomainEvent) -> Result<(), DispatchError>;
}

/// Collects subscriptions during startup wiring.
#[derive(Default)]
pub struct MediatorBuilder {
    subscriptions: HashMap<EventKind, Vec<Arc<dyn EventHandler>>>,
}

impl MediatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under each of `kinds`.
    ///
    /// A kind may have many handlers; they run in the order they were
    /// subscribed.
    pub fn subscribe(
        mut self,
        handler: Arc<dyn EventHandler>,
        kinds: impl IntoIterator<Item = EventKind>,
    ) -> Self {
        for kind in kinds {
            self.subscriptions
                .entry(kind)
                .or_default()
                .push(Arc::clone(&handler));
        }
        self
    }

    /// Freezes the subscription table.
    pub fn build(self) -> Mediator {
        Mediator {
            subscriptions: self.subscriptions,
        }
    }
}

/// Immutable event dispatcher.
pub struct Mediator {
    subscriptions: HashMap<EventKind, Vec<Arc<dyn EventHandler>>>,
}

impl Mediator {
    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::new()
    }

    /// A mediator with no subscriptions.
    pub fn empty() -> Self {
        MediatorBuilder::new().build()
    }

    /// Number of handlers subscribed to `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.subscriptions.get(&kind).map_or(0, Vec::len)
    }

    /// Delivers `event` to every handler subscribed to its kind.
    ///
    /// Stops at the first failing handler and returns its error; later
    /// handlers are not invoked. An event nobody subscribed to is a no-op.
    #[tracing::instrument(skip_all, fields(kind = %event.kind(), event_id = %event.id()))]
    pub async fn publish(&self, ctx: &Context, event: &dyn DomainEvent) -> Result<(), DispatchError> {
        let Some(handlers) = self.subscriptions.get(&event.kind()) else {
            tracing::trace!("no subscribers");
            return Ok(());
        };

        for handler in handlers {
            tracing::debug!(handler = handler.name(), "dispatching event");
            handler.handle(ctx, event).await?;
        }

        Ok(())
    }
}

impl std::fmt::Debug for Mediator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut table: Vec<(EventKind, Vec<&'static str>)> = self
            .subscriptions
            .iter()
            .map(|(kind, handlers)| (*kind, handlers.iter().map(|h| h.name()).collect()))
            .collect();
        table.sort_by_key(|(kind, _)| *kind);
        f.debug_struct("Mediator")
            .field("subscriptions", &table)
            .finish()
    }
}
