//! Integration tests for raising domain events on aggregates and routing
//! them through the mediator.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use domain::{
    AggregateRoot, Amount, Context, DispatchError, DomainEvent, Entity, EventHandler, EventKind,
    ExternalIdentityAdded, Mediator, Provider, Transaction, TransactionType, User,
    downcast_event,
};

/// Remembers the greeting it would have sent.
#[derive(Default)]
struct Greeter {
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl EventHandler for Greeter {
    fn name(&self) -> &'static str {
        "greeter"
    }

    async fn handle(&self, _ctx: &Context, event: &dyn DomainEvent) -> Result<(), DispatchError> {
        let added = downcast_event::<ExternalIdentityAdded>(event).ok_or(
            DispatchError::UnexpectedEvent {
                handler: self.name(),
                kind: event.kind(),
            },
        )?;
        self.sent.lock().unwrap().push((
            added.external_id.clone(),
            format!("Hello, {}!", added.user_name),
        ));
        Ok(())
    }
}

/// Counts every event it sees, by kind.
#[derive(Default)]
struct Tally {
    seen: Mutex<Vec<EventKind>>,
}

#[async_trait]
impl EventHandler for Tally {
    fn name(&self) -> &'static str {
        "tally"
    }

    async fn handle(&self, _ctx: &Context, event: &dyn DomainEvent) -> Result<(), DispatchError> {
        self.seen.lock().unwrap().push(event.kind());
        Ok(())
    }
}

#[tokio::test]
async fn registration_events_reach_their_handlers() {
    let greeter = Arc::new(Greeter::default());
    let tally = Arc::new(Tally::default());
    let mediator = Mediator::builder()
        .subscribe(tally.clone(), EventKind::ALL)
        .subscribe(greeter.clone(), [EventKind::ExternalIdentityAdded])
        .build();

    let user = User::register("Alice", Provider::Telegram, "1001").unwrap();
    let ctx = Context::background();
    for event in user.event_buffer().take() {
        mediator.publish(&ctx, event.as_ref()).await.unwrap();
    }

    assert!(user.events().is_empty());
    assert_eq!(
        *tally.seen.lock().unwrap(),
        vec![EventKind::UserCreated, EventKind::ExternalIdentityAdded]
    );
    assert_eq!(
        *greeter.sent.lock().unwrap(),
        vec![("1001".to_string(), "Hello, Alice!".to_string())]
    );
}

#[tokio::test]
async fn handler_rejects_events_it_cannot_read() {
    let greeter: Arc<dyn EventHandler> = Arc::new(Greeter::default());
    // Misconfigured on purpose: the greeter only understands identity events.
    let mediator = Mediator::builder()
        .subscribe(greeter, [EventKind::TransactionRecorded])
        .build();

    let user_id = domain::User::new("Bob").unwrap().id();
    let tx = Transaction::new(
        user_id,
        common::Id::new(),
        Amount::parse("5").unwrap(),
        TransactionType::Expense,
    )
    .unwrap();

    let events = tx.events();
    let err = mediator
        .publish(&Context::background(), events[0].as_ref())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        DispatchError::UnexpectedEvent {
            handler: "greeter",
            kind: EventKind::TransactionRecorded,
        }
    );
}

#[test]
fn payloads_describe_the_change() {
    let user = User::register("Alice", Provider::Telegram, "1001").unwrap();
    let events = user.events();

    let created = events[0].payload();
    assert_eq!(created["name"], "Alice");
    assert_eq!(created["user_id"], user.id().to_string());

    let added = events[1].payload();
    assert_eq!(added["provider"], "telegram");
    assert_eq!(added["external_id"], "1001");
}
