//! API server entry point.

use std::sync::Arc;

use api::config::Config;
use application::LoggingMessageSender;
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::postgres::PgPoolOptions;
use store::{Backend, InMemoryBackend, PgBackend};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if config.is_production() {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn describe_metrics() {
    metrics::describe_counter!("uow_commits_total", "Units of work committed");
    metrics::describe_counter!("uow_commit_failures_total", "Storage commits that failed");
    metrics::describe_counter!("uow_rollbacks_total", "Units of work rolled back");
    metrics::describe_histogram!(
        "uow_commit_duration_seconds",
        metrics::Unit::Seconds,
        "Time spent in the storage commit"
    );
    metrics::describe_counter!(
        "domain_events_dispatched_total",
        "Domain events delivered to every subscriber"
    );
    metrics::describe_counter!(
        "domain_event_dispatch_failures_total",
        "Domain events whose delivery failed after commit"
    );
    metrics::describe_counter!("users_registered_total", "New users registered");
    metrics::describe_counter!("welcome_messages_sent_total", "Welcome messages sent");
    metrics::describe_counter!("transactions_recorded_total", "Transactions recorded");
}

async fn serve<B: Backend>(config: &Config, backend: B, metrics_handle: PrometheusHandle) {
    let state = api::create_default_state(
        backend,
        Arc::new(LoggingMessageSender),
        config.request_timeout,
    );
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, env = %config.app_env, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");
    describe_metrics();

    // 3. Pick the storage backend and serve
    match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .connect(url)
                .await
                .expect("failed to connect to PostgreSQL");
            let backend = PgBackend::new(pool);
            backend
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!(
                max_connections = config.db_max_connections,
                "using PostgreSQL storage"
            );
            serve(&config, backend, metrics_handle).await;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage");
            serve(&config, InMemoryBackend::new(), metrics_handle).await;
        }
    }

    tracing::info!("server shut down gracefully");
}
