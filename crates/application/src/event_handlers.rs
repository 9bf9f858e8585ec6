//! Subscribers to the domain events raised by the core aggregates.

use std::sync::Arc;

use async_trait::async_trait;
use domain::{
    Context, DispatchError, DomainEvent, EventHandler, EventKind, ExternalIdentityAdded,
    Mediator, TransactionRecorded, UserCreated, downcast_event,
};
use metrics::counter;
use tracing::info;

use crate::sender::MessageSender;

/// Logs every new user.
#[derive(Debug, Default)]
pub struct UserCreatedLogger;

#[async_trait]
impl EventHandler for UserCreatedLogger {
    fn name(&self) -> &'static str {
        "user_created_logger"
    }

    async fn handle(&self, ctx: &Context, event: &dyn DomainEvent) -> Result<(), DispatchError> {
        let created = downcast_event::<UserCreated>(event).ok_or(DispatchError::UnexpectedEvent {
            handler: self.name(),
            kind: event.kind(),
        })?;

        info!(
            request_id = %ctx.request_id(),
            user_id = %created.user_id,
            name = %created.name,
            "user created"
        );
        Ok(())
    }
}

/// Greets a user on the account they just linked.
pub struct WelcomeMessageHandler {
    sender: Arc<dyn MessageSender>,
}

impl WelcomeMessageHandler {
    pub fn new(sender: Arc<dyn MessageSender>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl EventHandler for WelcomeMessageHandler {
    fn name(&self) -> &'static str {
        "welcome_message"
    }

    async fn handle(&self, ctx: &Context, event: &dyn DomainEvent) -> Result<(), DispatchError> {
        let added = downcast_event::<ExternalIdentityAdded>(event).ok_or(
            DispatchError::UnexpectedEvent {
                handler: self.name(),
                kind: event.kind(),
            },
        )?;

        let text = format!("Hello, {}!", added.user_name);
        ctx.run(self.sender.send(added.provider, &added.external_id, &text))
            .await
            .map_err(|err| DispatchError::handler(self.name(), event.kind(), err))?
            .map_err(|err| DispatchError::handler(self.name(), event.kind(), err))?;

        counter!("welcome_messages_sent_total").increment(1);
        Ok(())
    }
}

/// Audit trail for recorded transactions.
#[derive(Debug, Default)]
pub struct TransactionAuditHandler;

#[async_trait]
impl EventHandler for TransactionAuditHandler {
    fn name(&self) -> &'static str {
        "transaction_audit"
    }

    async fn handle(&self, ctx: &Context, event: &dyn DomainEvent) -> Result<(), DispatchError> {
        let recorded = downcast_event::<TransactionRecorded>(event).ok_or(
            DispatchError::UnexpectedEvent {
                handler: self.name(),
                kind: event.kind(),
            },
        )?;

        info!(
            request_id = %ctx.request_id(),
            transaction_id = %recorded.transaction_id,
            user_id = %recorded.user_id,
            category_id = %recorded.category_id,
            amount = %recorded.amount,
            transaction_type = %recorded.transaction_type,
            "transaction recorded"
        );
        counter!("transactions_recorded_total", "type" => recorded.transaction_type.as_str())
            .increment(1);
        Ok(())
    }
}

/// Wires the standard subscribers into a mediator.
pub fn build_mediator(sender: Arc<dyn MessageSender>) -> Mediator {
    Mediator::builder()
        .subscribe(Arc::new(UserCreatedLogger), [EventKind::UserCreated])
        .subscribe(
            Arc::new(WelcomeMessageHandler::new(sender)),
            [EventKind::ExternalIdentityAdded],
        )
        .subscribe(
            Arc::new(TransactionAuditHandler),
            [EventKind::TransactionRecorded],
        )
        .build()
}
