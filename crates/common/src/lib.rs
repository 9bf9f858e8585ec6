//! Shared types used by every layer of the finance tracking core.

pub mod id;

pub use id::{Id, IdFormatError};
