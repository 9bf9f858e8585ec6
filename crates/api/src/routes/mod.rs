//! HTTP route handlers.

pub mod categories;
pub mod health;
pub mod metrics;
pub mod transactions;
pub mod users;
