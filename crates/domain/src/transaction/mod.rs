//! Transaction aggregate and the money amount it records.

mod aggregate;
mod amount;
mod events;

pub use aggregate::{Transaction, TransactionType};
pub use amount::Amount;
pub use events::TransactionRecorded;
