// src/lib.rs
use app_state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use handlers::*;

// Public exports (visible outside this module)
pub mod client;
pub mod domain;
pub mod error;
pub mod security;
pub mod services;
pub mod wire;

// Internal-only exports (sibling access within this module)
mod app_state;
mod config;
mod handlers;
mod infrastructure;

pub use config::*;
pub use error::{ErrorCode, ServiceError, StartupError};
pub use services::{CredentialAuthority, InventoryLedger};

// Publicly expose the infrastructure creation functions
pub use infrastructure::{
    create_noop_metrics, // ---
    create_postgres_repository,
    create_prom_metrics,
    InMemoryStore,
};

use domain::MetricsPtr;
use security::{PasswordHasher, TokenIssuer};

/// Installs the global `tracing` subscriber, filtered by `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    // ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .ok(); // Ignores if already initialized
}

/// Builds the configured metrics backend.
pub fn create_metrics(kind: MetricsKind) -> Result<MetricsPtr, StartupError> {
    // ---
    let metrics = match kind {
        MetricsKind::Prometheus => create_prom_metrics(),
        MetricsKind::Noop => create_noop_metrics(),
    };
    metrics.map_err(|e| StartupError::Metrics(format!("{e:#}")))
}

/// HTTP router of the Credential Authority.
pub fn create_credential_router(service: Arc<CredentialAuthority>, metrics: MetricsPtr) -> Router {
    // ---
    let app_state = AppState::new(service, metrics);

    Router::new()
        .route("/", get(credential_root_handler))
        .route("/health", get(health_check::<CredentialAuthority>))
        .route("/metrics", get(metrics_handler::<CredentialAuthority>))
        .route("/users", post(create_user))
        .route("/authenticate", post(authenticate))
        .route("/tokens/validate", post(validate_token))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            track_requests::<CredentialAuthority>,
        ))
        .with_state(app_state)
}

/// HTTP router of the Inventory Ledger.
pub fn create_inventory_router(service: Arc<InventoryLedger>, metrics: MetricsPtr) -> Router {
    // ---
    let app_state = AppState::new(service, metrics);

    Router::new()
        .route("/", get(inventory_root_handler))
        .route("/health", get(health_check::<InventoryLedger>))
        .route("/metrics", get(metrics_handler::<InventoryLedger>))
        .nest(
            "/items",
            Router::new()
                .route("/", get(list_items).post(insert_item))
                .route("/search", get(search_items))
                .route(
                    "/{id}",
                    get(get_item).put(update_item).delete(delete_item),
                )
                .route("/{id}/increment", post(increment_item)),
        )
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            track_requests::<InventoryLedger>,
        ))
        .with_state(app_state)
}

/// Connects, migrates and probes the user store, then assembles the router.
pub async fn build_credential_app(config: &CredentialServiceConfig) -> Result<Router, StartupError> {
    // ---
    let metrics = create_metrics(config.metrics)?;

    let pool = infrastructure::init_database_with_retry(&config.store).await?;
    infrastructure::run_credential_migrations(&pool).await?;
    infrastructure::probe_store(&pool, config.store.operation_timeout).await?;

    let repository = Arc::new(create_postgres_repository(
        pool,
        config.store.operation_timeout,
    ));
    let hasher = PasswordHasher::new(config.token.bcrypt_cost).map_err(StartupError::config)?;
    let tokens = TokenIssuer::new(&config.token.secret);

    let service = Arc::new(CredentialAuthority::new(
        repository,
        hasher,
        tokens,
        metrics.clone(),
    ));

    Ok(create_credential_router(service, metrics))
}

/// Connects, migrates and probes the item store, then assembles the router.
pub async fn build_inventory_app(config: &InventoryServiceConfig) -> Result<Router, StartupError> {
    // ---
    let metrics = create_metrics(config.metrics)?;

    let pool = infrastructure::init_database_with_retry(&config.store).await?;
    infrastructure::run_inventory_migrations(&pool).await?;
    infrastructure::probe_store(&pool, config.store.operation_timeout).await?;

    let repository = Arc::new(create_postgres_repository(
        pool,
        config.store.operation_timeout,
    ));
    let service = Arc::new(InventoryLedger::new(repository, metrics.clone()));

    Ok(create_inventory_router(service, metrics))
}

/// Binds `addr` and serves until Ctrl-C.
pub async fn serve(router: Router, addr: &str) -> Result<(), StartupError> {
    // ---
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: addr.to_string(),
            source,
        })?;

    tracing::info!("Listening on {addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)
}

async fn shutdown_signal() {
    // ---
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {err}");
        // Without a signal handler, keep serving.
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
