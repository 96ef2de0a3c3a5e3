//! Store connection lifecycle.
//!
//! The pool is dialed once at startup with a bounded retry, migrated, and
//! probed before any request is accepted. Every failure is returned as a
//! [`StartupError`] so the binary decides how to terminate.

mod postgres_repository;

#[cfg(test)]
mod tests;

pub use postgres_repository::create_postgres_repository;

use crate::config::StoreConfig;
use crate::error::{StartupError, StoreError};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Pause between connection attempts, multiplied by the attempt number.
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Connects to the store, retrying up to `config.retry_count` times.
///
/// # Errors
/// Returns [`StartupError::Connect`] once all attempts are spent.
pub async fn init_database_with_retry(config: &StoreConfig) -> Result<PgPool, StartupError> {
    // ---
    let attempts = config.retry_count.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        tracing::info!("Connecting to store (attempt {attempt}/{attempts})");

        let result = PgPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await;

        match result {
            Ok(pool) => return Ok(pool),
            Err(err) if attempt < attempts => {
                tracing::warn!("Store connection failed: {err}; retrying");
                tokio::time::sleep(RETRY_BACKOFF * attempt).await;
            }
            Err(source) => {
                tracing::error!("Store connection failed after {attempt} attempt(s)");
                return Err(StartupError::Connect {
                    attempts: attempt,
                    source,
                });
            }
        }
    }
}

/// Liveness probe run before the listener starts.
pub async fn probe_store(pool: &PgPool, timeout: Duration) -> Result<(), StartupError> {
    // ---
    let probe = sqlx::query("SELECT 1").execute(pool);

    match tokio::time::timeout(timeout, probe).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(err)) => Err(StartupError::Probe(StoreError::backend(err))),
        Err(_) => Err(StartupError::Probe(StoreError::Timeout(timeout))),
    }
}

// Both services record their migrations in the one `_sqlx_migrations`
// table, so versions must be unique across the two sets and each migrator
// has to tolerate the other's entries.

/// Applies the `users` schema owned by the Credential Authority.
pub async fn run_credential_migrations(pool: &PgPool) -> Result<(), StartupError> {
    // ---
    let mut migrator = sqlx::migrate!("./migrations/credential");
    migrator.set_ignore_missing(true);
    migrator.run(pool).await?;
    Ok(())
}

/// Applies the `inventory_items` schema owned by the Inventory Ledger.
pub async fn run_inventory_migrations(pool: &PgPool) -> Result<(), StartupError> {
    // ---
    let mut migrator = sqlx::migrate!("./migrations/inventory");
    migrator.set_ignore_missing(true);
    migrator.run(pool).await?;
    Ok(())
}
