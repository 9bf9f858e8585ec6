//! User aggregate, its external identities, and the events it raises.

mod aggregate;
mod events;
mod identity;

pub use aggregate::User;
pub use events::{ExternalIdentityAdded, UserCreated};
pub use identity::{ExternalIdentity, Provider};
