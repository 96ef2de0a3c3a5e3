use super::postgres_repository::*;
use super::*;
use crate::domain::{IncrementOutcome, InventoryRepository, ItemFilter, NewUser, UserRepository};
use crate::error::StoreError;
use futures::TryStreamExt;
use once_cell::sync::Lazy;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use uuid::Uuid;

// One runtime to rule them all...
/// Shared tokio runtime for all database tests.
///
/// The pool must outlive each test: a pool created inside a per-test runtime
/// would have its connections closed when that runtime drops.
static RUNTIME: Lazy<Runtime> = Lazy::new(|| {
    // ---
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create TOKIO runtime")
});

static TRACING_INIT: std::sync::Once = std::sync::Once::new();

fn init_tracing() {
    // ---
    TRACING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_ansi(false) // No colorization, makes logs easier to read.
            .with_test_writer()
            .try_init()
            .ok();
    });
}

async fn setup_pool() -> (PgPool, Duration) {
    // ---
    init_tracing();

    let config = StoreConfig::from_env().expect("store config");
    let pool = init_database_with_retry(&config)
        .await
        .expect("database init failed");
    run_credential_migrations(&pool).await.expect("credential migrations");
    run_inventory_migrations(&pool).await.expect("inventory migrations");

    (pool, config.operation_timeout)
}

async fn setup_repo() -> PostgresRepository {
    // ---
    let (pool, timeout) = setup_pool().await;
    create_postgres_repository(pool, timeout)
}

fn unique_name(prefix: &str) -> String {
    // ---
    format!("{prefix}-{}", &Uuid::new_v4().simple().to_string()[..8])
}

#[test]
fn pool_timeout_is_reported_as_store_timeout() {
    // ---
    let timeout = Duration::from_secs(3);
    let err = map_sqlx_error(sqlx::Error::PoolTimedOut, timeout);

    assert!(matches!(err, StoreError::Timeout(t) if t == timeout));
}

#[test]
fn row_not_found_is_a_backend_error() {
    // ---
    let err = map_sqlx_error(sqlx::Error::RowNotFound, Duration::from_secs(1));

    assert!(matches!(err, StoreError::Backend(_)));
}

#[test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
fn username_unique_constraint_is_enforced() {
    // ---
    RUNTIME.block_on(async {
        // ---
        let repo = setup_repo().await;
        let username = unique_name("thorin");

        let user = NewUser {
            username: username.clone(),
            password_hash: "$2b$04$placeholder".to_string(),
        };
        repo.insert_user(user.clone()).await.expect("first insert");

        let second = repo.insert_user(user).await;
        assert!(matches!(second, Err(StoreError::UniqueViolation)));

        let found = repo
            .find_user_by_username(&username)
            .await
            .expect("lookup")
            .expect("user present");
        assert_eq!(found.username, username);
    });
}

#[test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
fn conditional_increment_never_goes_negative() {
    // ---
    RUNTIME.block_on(async {
        // ---
        let repo = setup_repo().await;
        let id = repo
            .insert_item(unique_name("lantern"), 3)
            .await
            .expect("insert");

        assert_eq!(
            repo.increment_quantity(id, -2).await.unwrap(),
            IncrementOutcome::Applied { quantity: 1 }
        );
        assert_eq!(
            repo.increment_quantity(id, -2).await.unwrap(),
            IncrementOutcome::Insufficient { available: 1 }
        );
        assert_eq!(
            repo.increment_quantity(Uuid::new_v4(), 1).await.unwrap(),
            IncrementOutcome::NotFound
        );
    });
}

#[test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
fn concurrent_decrements_do_not_lose_updates() {
    // ---
    RUNTIME.block_on(async {
        // ---
        let repo = Arc::new(setup_repo().await);
        let id = repo
            .insert_item(unique_name("rope"), 100)
            .await
            .expect("insert");

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.increment_quantity(id, -1).await })
            })
            .collect();

        for task in tasks {
            let outcome = task.await.expect("join").expect("increment");
            assert!(matches!(outcome, IncrementOutcome::Applied { .. }));
        }

        let item = repo.find_item(id).await.unwrap().expect("item present");
        assert_eq!(item.quantity, 50);
    });
}

#[test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
fn pattern_scan_matches_substring() {
    // ---
    RUNTIME.block_on(async {
        // ---
        let repo = setup_repo().await;
        let marker = unique_name("waterfall");
        let id = repo
            .insert_item(format!("autumn {marker}"), 7)
            .await
            .expect("insert");

        let found: Vec<_> = repo
            .scan_items(ItemFilter::NamePattern(marker))
            .try_collect()
            .await
            .expect("scan");

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);

        assert_eq!(repo.delete_item(id).await.unwrap(), 1);
        assert_eq!(repo.delete_item(id).await.unwrap(), 0);
    });
}

#[test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
fn invalid_pattern_is_structured() {
    // ---
    RUNTIME.block_on(async {
        // ---
        let repo = setup_repo().await;

        // Valid for the regex crate, rejected by Postgres.
        let result: Result<Vec<_>, _> = repo
            .scan_items(ItemFilter::NamePattern(r"\p{L}".to_string()))
            .try_collect()
            .await;

        assert!(matches!(
            result,
            Err(StoreError::InvalidPattern(_))
        ));
    });
}

#[test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
fn both_services_migrate_one_database_repeatedly() {
    // ---
    RUNTIME.block_on(async {
        // ---
        let (pool, _) = setup_pool().await;

        // Either service may start first, and restarts re-run their set.
        run_inventory_migrations(&pool).await.expect("inventory again");
        run_credential_migrations(&pool).await.expect("credential again");
        run_inventory_migrations(&pool).await.expect("inventory once more");
    });
}

#[test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
fn blocked_store_times_out_instead_of_hanging() {
    // ---
    RUNTIME.block_on(async {
        // ---
        let (pool, timeout) = setup_pool().await;
        let repo = create_postgres_repository(pool.clone(), timeout);
        let id = repo
            .insert_item(unique_name("hourglass"), 1)
            .await
            .expect("insert");

        let mut locker = pool.begin().await.expect("begin");
        sqlx::query("LOCK TABLE inventory_items IN ACCESS EXCLUSIVE MODE")
            .execute(&mut *locker)
            .await
            .expect("lock");

        let hasty = create_postgres_repository(pool.clone(), Duration::from_millis(200));
        let started = Instant::now();

        let lookup = hasty.find_item(id).await;
        assert!(matches!(lookup, Err(StoreError::Timeout(_))), "{lookup:?}");

        let scan: Result<Vec<_>, _> = hasty.scan_items(ItemFilter::All).try_collect().await;
        assert!(matches!(scan, Err(StoreError::Timeout(_))), "{scan:?}");

        assert!(started.elapsed() < Duration::from_secs(5));

        locker.rollback().await.expect("rollback");
    });
}

#[test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
fn increment_racing_a_delete_reports_not_found() {
    // ---
    RUNTIME.block_on(async {
        // ---
        let (pool, timeout) = setup_pool().await;
        let repo = Arc::new(create_postgres_repository(pool.clone(), timeout));
        let id = repo
            .insert_item(unique_name("candle"), 5)
            .await
            .expect("insert");

        // Delete in an open transaction so the increment starts while the
        // row is still visible, then blocks on its row lock.
        let mut deleter = pool.begin().await.expect("begin");
        sqlx::query("DELETE FROM inventory_items WHERE id = $1")
            .bind(id)
            .execute(&mut *deleter)
            .await
            .expect("delete");

        let pending = {
            let repo = repo.clone();
            tokio::spawn(async move { repo.increment_quantity(id, -1).await })
        };
        tokio::time::sleep(Duration::from_millis(300)).await;
        deleter.commit().await.expect("commit");

        let outcome = pending.await.expect("join").expect("increment");
        assert_eq!(outcome, IncrementOutcome::NotFound);
    });
}
