//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency and are
//! serialized because each one truncates the tables. Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use domain::{
    AggregateRoot, Amount, Category, CategoryType, Context, DispatchError, DomainEvent, Entity,
    EventHandler, EventKind, Mediator, Provider, Transaction, TransactionType, User,
};
use serial_test::serial;
use sqlx::PgPool;
use store::{
    PgBackend, StoreError, TransactionStateError, UnitOfWork, UnitOfWorkFactory,
    UowState,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for migrations
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            // Run migrations using raw_sql to execute multiple statements
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_finance_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Records the kinds of published events.
#[derive(Default)]
struct KindLog {
    kinds: Mutex<Vec<EventKind>>,
}

#[async_trait]
impl EventHandler for KindLog {
    fn name(&self) -> &'static str {
        "kind_log"
    }

    async fn handle(&self, _ctx: &Context, event: &dyn DomainEvent) -> Result<(), DispatchError> {
        self.kinds.lock().unwrap().push(event.kind());
        Ok(())
    }
}

/// Get a fresh backend with its own pool and cleared tables
async fn get_test_factory() -> (UnitOfWorkFactory<PgBackend>, Arc<KindLog>) {
    let info = get_container_info().await;

    // Create a fresh pool for each test to avoid connection issues
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    // Clear tables for test isolation
    sqlx::query("TRUNCATE TABLE transactions, categories, external_identities, users")
        .execute(&pool)
        .await
        .unwrap();

    let log = Arc::new(KindLog::default());
    let mediator = Mediator::builder()
        .subscribe(log.clone(), EventKind::ALL)
        .build();
    (
        UnitOfWorkFactory::new(PgBackend::new(pool), Arc::new(mediator)),
        log,
    )
}

async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn save_user(ctx: &Context, uow: &mut UnitOfWork<PgBackend>, user: &User) {
    uow.user_repository().create(ctx, user).await.unwrap();
    for identity in user.external_identities() {
        uow.external_identity_repository()
            .add(ctx, identity)
            .await
            .unwrap();
    }
}

#[tokio::test]
#[serial]
async fn commit_persists_and_publishes() {
    let (factory, log) = get_test_factory().await;
    let ctx = Context::background();
    let mut uow = factory.create(&ctx).unwrap();

    uow.begin(&ctx).await.unwrap();
    let user = User::register("Alice", Provider::Telegram, "1001").unwrap();
    save_user(&ctx, &mut uow, &user).await;
    uow.track(&user);
    uow.commit(&ctx).await.unwrap();

    assert_eq!(uow.state(), UowState::Committed);
    assert_eq!(count(factory.backend().pool(), "users").await, 1);
    assert_eq!(
        *log.kinds.lock().unwrap(),
        vec![EventKind::UserCreated, EventKind::ExternalIdentityAdded]
    );

    let mut reader = factory.create(&ctx).unwrap();
    let found = reader
        .user_repository()
        .find_by_external_identity(&ctx, Provider::Telegram, "1001")
        .await
        .unwrap();
    assert_eq!(found.id(), user.id());
    assert_eq!(found.name(), "Alice");
    assert_eq!(found.external_identities().len(), 1);
    assert!(found.events().is_empty());
}

#[tokio::test]
#[serial]
async fn rollback_discards_writes() {
    let (factory, log) = get_test_factory().await;
    let ctx = Context::background();
    let mut uow = factory.create(&ctx).unwrap();

    uow.begin(&ctx).await.unwrap();
    let user = User::new("Alice").unwrap();
    uow.user_repository().create(&ctx, &user).await.unwrap();
    uow.track(&user);
    uow.rollback_unless_committed().await.unwrap();

    assert_eq!(uow.state(), UowState::Idle);
    assert_eq!(count(factory.backend().pool(), "users").await, 0);
    assert!(log.kinds.lock().unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn reads_inside_a_transaction_see_its_writes() {
    let (factory, _) = get_test_factory().await;
    let ctx = Context::background();
    let mut uow = factory.create(&ctx).unwrap();

    uow.begin(&ctx).await.unwrap();
    let user = User::new("Alice").unwrap();
    uow.user_repository().create(&ctx, &user).await.unwrap();

    let found = uow
        .user_repository()
        .find_by_id(&ctx, user.id())
        .await
        .unwrap();
    assert_eq!(found.id(), user.id());

    let mut outsider = factory.create(&ctx).unwrap();
    let err = outsider
        .user_repository()
        .find_by_id(&ctx, user.id())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    uow.rollback_unless_committed().await.unwrap();
}

#[tokio::test]
#[serial]
async fn duplicate_external_identity_maps_to_already_exists() {
    let (factory, _) = get_test_factory().await;
    let ctx = Context::background();

    let mut first = factory.create(&ctx).unwrap();
    first.begin(&ctx).await.unwrap();
    let alice = User::register("Alice", Provider::Telegram, "1001").unwrap();
    save_user(&ctx, &mut first, &alice).await;
    first.commit(&ctx).await.unwrap();

    let mut second = factory.create(&ctx).unwrap();
    second.begin(&ctx).await.unwrap();
    let bob = User::register("Bob", Provider::Telegram, "1001").unwrap();
    second.user_repository().create(&ctx, &bob).await.unwrap();
    let err = second
        .external_identity_repository()
        .add(&ctx, &bob.external_identities()[0])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StoreError::AlreadyExists {
            field: "external_id",
            ..
        }
    ));
    second.rollback_unless_committed().await.unwrap();
    assert_eq!(count(factory.backend().pool(), "users").await, 1);
}

#[tokio::test]
#[serial]
async fn categories_and_transactions_round_trip() {
    let (factory, _) = get_test_factory().await;
    let ctx = Context::background();
    let mut uow = factory.create(&ctx).unwrap();

    uow.begin(&ctx).await.unwrap();
    let user = User::new("Alice").unwrap();
    uow.user_repository().create(&ctx, &user).await.unwrap();

    let parent = Category::new("Health", user.id(), None, CategoryType::Expense).unwrap();
    let child =
        Category::new("Medicine", user.id(), Some(parent.id()), CategoryType::Expense).unwrap();
    let categories = uow.category_repository();
    categories.create(&ctx, &parent).await.unwrap();
    categories.create(&ctx, &child).await.unwrap();

    let tx = Transaction::new(
        user.id(),
        child.id(),
        Amount::parse("12,50").unwrap(),
        TransactionType::Expense,
    )
    .unwrap();
    uow.transaction_repository().add(&ctx, &tx).await.unwrap();
    uow.commit(&ctx).await.unwrap();

    let mut reader = factory.create(&ctx).unwrap();
    let listed = reader
        .category_repository()
        .list_by_user_and_type(&ctx, user.id(), CategoryType::Expense)
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].name(), "Health");
    assert_eq!(listed[1].parent_id(), Some(parent.id()));

    let recorded = reader
        .transaction_repository()
        .list_by_user(&ctx, user.id())
        .await
        .unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].amount().minor_units(), 1250);
    assert_eq!(recorded[0].transaction_type(), TransactionType::Expense);
}

#[tokio::test]
#[serial]
async fn missing_category_maps_to_not_found() {
    let (factory, _) = get_test_factory().await;
    let ctx = Context::background();
    let mut uow = factory.create(&ctx).unwrap();

    let user = User::new("Alice").unwrap();
    uow.user_repository().create(&ctx, &user).await.unwrap();
    let tx = Transaction::new(
        user.id(),
        common::Id::new(),
        Amount::parse("1").unwrap(),
        TransactionType::Income,
    )
    .unwrap();

    let err = uow
        .transaction_repository()
        .add(&ctx, &tx)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "category", .. }));
}

#[tokio::test]
#[serial]
async fn locked_user_serializes_category_writes() {
    let (factory, _) = get_test_factory().await;
    let ctx = Context::background();
    let user = User::register("Alice", Provider::Telegram, "1001").unwrap();
    let mut setup = factory.create(&ctx).unwrap();
    setup.begin(&ctx).await.unwrap();
    save_user(&ctx, &mut setup, &user).await;
    setup.commit(&ctx).await.unwrap();

    let mut first = factory.create(&ctx).unwrap();
    first.begin(&ctx).await.unwrap();
    first
        .user_repository()
        .lock_for_update(&ctx, user.id())
        .await
        .unwrap();

    let mut second = factory.create(&ctx).unwrap();
    second.begin(&ctx).await.unwrap();
    let second_users = second.user_repository();
    let mut waiting = second_users.lock_for_update(&ctx, user.id());
    assert!(
        tokio::time::timeout(std::time::Duration::from_millis(200), &mut waiting)
            .await
            .is_err()
    );

    let food = Category::new("Food", user.id(), None, CategoryType::Expense).unwrap();
    first.category_repository().create(&ctx, &food).await.unwrap();
    first.commit(&ctx).await.unwrap();

    waiting.await.unwrap();
    assert!(
        second
            .category_repository()
            .has_any_for_user(&ctx, user.id())
            .await
            .unwrap()
    );
    second.rollback_unless_committed().await.unwrap();
}

#[tokio::test]
#[serial]
async fn begin_twice_is_rejected() {
    let (factory, _) = get_test_factory().await;
    let ctx = Context::background();
    let mut uow = factory.create(&ctx).unwrap();

    uow.begin(&ctx).await.unwrap();
    assert!(matches!(
        uow.begin(&ctx).await.unwrap_err(),
        StoreError::TransactionState(TransactionStateError::AlreadyActive)
    ));
    uow.rollback_unless_committed().await.unwrap();
}

#[tokio::test]
#[serial]
async fn unknown_external_identity_is_not_found() {
    let (factory, _) = get_test_factory().await;
    let ctx = Context::background();
    let mut uow = factory.create(&ctx).unwrap();

    let err = uow
        .user_repository()
        .find_by_external_identity(&ctx, Provider::Telegram, "404")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "user", .. }));
}
