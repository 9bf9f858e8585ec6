//! Domain layer for the finance tracker.
//!
//! This crate provides:
//! - Entity and aggregate primitives with a per-aggregate event buffer
//! - The DomainEvent contract and the in-process Mediator that dispatches it
//! - A request Context carrying a deadline and request id
//! - The User, Category and Transaction models

pub mod aggregate;
pub mod category;
pub mod context;
pub mod entity;
pub mod error;
pub mod event;
pub mod mediator;
pub mod transaction;
pub mod user;

pub use aggregate::{AggregateRoot, BaseAggregate, EventBuffer};
pub use category::{Category, CategoryType};
pub use context::{Context, DeadlineExceeded};
pub use entity::{BaseEntity, Entity};
pub use error::{DomainError, ErrorKind};
pub use event::{DomainEvent, EventKind, downcast_event};
pub use mediator::{DispatchError, EventHandler, Mediator, MediatorBuilder};
pub use transaction::{Amount, Transaction, TransactionRecorded, TransactionType};
pub use user::{ExternalIdentity, ExternalIdentityAdded, Provider, User, UserCreated};
