//! Use cases of the finance tracker.
//!
//! Commands and queries are validated on construction and executed by one
//! handler each. Handlers are generic over the storage [`store::Backend`] and
//! obtain a fresh unit of work per call. Domain events raised during a
//! command are delivered to the subscribers in [`event_handlers`] after the
//! transaction commits.

pub mod commands;
pub mod default_categories;
pub mod error;
pub mod event_handlers;
pub mod handlers;
pub mod queries;
pub mod sender;

pub use commands::{CreateDefaultCategories, RecordTransaction, RegisterUser};
pub use error::{AppError, Result};
pub use event_handlers::{
    TransactionAuditHandler, UserCreatedLogger, WelcomeMessageHandler, build_mediator,
};
pub use handlers::{
    CreateDefaultCategoriesHandler, GetUserCategoriesHandler, GetUserHandler,
    RecordTransactionHandler, RegisterUserHandler,
};
pub use queries::{
    CategoryView, DefaultCategoriesCreated, GetUser, GetUserCategories, IdentityView,
    Registration, UserView,
};
pub use sender::{
    InMemoryMessageSender, LoggingMessageSender, MessageSender, SendError, SentMessage,
};
