use futures::{StreamExt, TryStreamExt};
use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::domain::{
    IncrementOutcome, InventoryItem, InventoryRepository, ItemFilter, ItemId, ItemStream, NewUser,
    StoreProbe, User, UserRepository,
};
use crate::error::StoreError;

/// Rows buffered between a scan task and its consumer.
const SCAN_BUFFER: usize = 64;

// SQLSTATE codes we translate into structured errors.
const INVALID_REGULAR_EXPRESSION: &str = "2201B";
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: Uuid,
    name: String,
    quantity: i64,
}

impl From<ItemRow> for InventoryItem {
    fn from(r: ItemRow) -> Self {
        // ---
        InventoryItem {
            id: r.id,
            name: r.name,
            quantity: r.quantity,
        }
    }
}

pub fn create_postgres_repository(pool: PgPool, operation_timeout: Duration) -> PostgresRepository {
    // ---
    PostgresRepository::new(pool, operation_timeout)
}

/// Postgres-backed store for both services.
///
/// Each service only touches its own table; the pool is shared by all
/// request handlers of the owning process.
#[derive(Clone)]
pub struct PostgresRepository {
    // ---
    pool: PgPool,
    operation_timeout: Duration,
}

impl PostgresRepository {
    // ---
    pub fn new(pool: PgPool, operation_timeout: Duration) -> Self {
        // ---
        Self {
            pool,
            operation_timeout,
        }
    }

    /// Runs one store operation under the configured timeout.
    async fn bounded<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        // ---
        match tokio::time::timeout(self.operation_timeout, op).await {
            Ok(result) => result.map_err(|e| map_sqlx_error(e, self.operation_timeout)),
            Err(_) => Err(StoreError::Timeout(self.operation_timeout)),
        }
    }
}

pub(crate) fn map_sqlx_error(err: sqlx::Error, timeout: Duration) -> StoreError {
    // ---
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::UniqueViolation;
        }
        match db.code().as_deref() {
            Some(INVALID_REGULAR_EXPRESSION) => {
                return StoreError::InvalidPattern(db.message().to_string())
            }
            Some(NUMERIC_VALUE_OUT_OF_RANGE) => return StoreError::OutOfRange,
            _ => {}
        }
    }

    if matches!(err, sqlx::Error::PoolTimedOut) {
        return StoreError::Timeout(timeout);
    }

    StoreError::backend(err)
}

#[async_trait::async_trait]
impl StoreProbe for PostgresRepository {
    // ---
    async fn ping(&self) -> Result<(), StoreError> {
        // ---
        self.bounded(sqlx::query("SELECT 1").execute(&self.pool))
            .await
            .map(|_| ())
    }
}

#[async_trait::async_trait]
impl UserRepository for PostgresRepository {
    // ---
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        // ---
        let row = self
            .bounded(
                sqlx::query_as::<_, UserRow>(
                    "SELECT id, username, password_hash FROM users WHERE username = $1",
                )
                .bind(username)
                .fetch_optional(&self.pool),
            )
            .await?;

        Ok(row.map(|r| User {
            id: r.id,
            username: r.username,
            password_hash: r.password_hash,
        }))
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        // ---
        let id = Uuid::new_v4();

        self.bounded(
            sqlx::query("INSERT INTO users (id, username, password_hash) VALUES ($1, $2, $3)")
                .bind(id)
                .bind(&user.username)
                .bind(&user.password_hash)
                .execute(&self.pool),
        )
        .await?;

        Ok(User {
            id,
            username: user.username,
            password_hash: user.password_hash,
        })
    }
}

#[async_trait::async_trait]
impl InventoryRepository for PostgresRepository {
    // ---
    fn scan_items(&self, filter: ItemFilter) -> ItemStream {
        // ---
        let pool = self.pool.clone();
        let timeout = self.operation_timeout;
        let (tx, rx) = mpsc::channel(SCAN_BUFFER);

        // The whole scan shares one deadline, like a single bounded query.
        tokio::spawn(async move {
            let deadline = tokio::time::Instant::now() + timeout;

            let mut rows = match &filter {
                ItemFilter::All => sqlx::query_as::<_, ItemRow>(
                    "SELECT id, name, quantity FROM inventory_items ORDER BY created_at, id",
                )
                .fetch(&pool),
                ItemFilter::NamePattern(pattern) => sqlx::query_as::<_, ItemRow>(
                    "SELECT id, name, quantity FROM inventory_items
                     WHERE name ~ $1 ORDER BY created_at, id",
                )
                .bind(pattern.as_str())
                .fetch(&pool),
            };

            loop {
                let next = match tokio::time::timeout_at(deadline, rows.try_next()).await {
                    Ok(Ok(Some(row))) => Ok(InventoryItem::from(row)),
                    Ok(Ok(None)) => break,
                    Ok(Err(err)) => Err(map_sqlx_error(err, timeout)),
                    Err(_) => Err(StoreError::Timeout(timeout)),
                };

                let failed = next.is_err();
                if tx.send(next).await.is_err() {
                    tracing::debug!("Scan consumer went away; stopping early");
                    break;
                }
                if failed {
                    break;
                }
            }
        });

        ReceiverStream::new(rx).boxed()
    }

    async fn find_item(&self, id: ItemId) -> Result<Option<InventoryItem>, StoreError> {
        // ---
        let row = self
            .bounded(
                sqlx::query_as::<_, ItemRow>(
                    "SELECT id, name, quantity FROM inventory_items WHERE id = $1",
                )
                .bind(id)
                .fetch_optional(&self.pool),
            )
            .await?;

        Ok(row.map(InventoryItem::from))
    }

    async fn insert_item(&self, name: String, quantity: i64) -> Result<ItemId, StoreError> {
        // ---
        let id = Uuid::new_v4();

        self.bounded(
            sqlx::query("INSERT INTO inventory_items (id, name, quantity) VALUES ($1, $2, $3)")
                .bind(id)
                .bind(&name)
                .bind(quantity)
                .execute(&self.pool),
        )
        .await?;

        Ok(id)
    }

    async fn update_item(&self, item: InventoryItem) -> Result<u64, StoreError> {
        // ---
        let result = self
            .bounded(
                sqlx::query("UPDATE inventory_items SET name = $2, quantity = $3 WHERE id = $1")
                    .bind(item.id)
                    .bind(&item.name)
                    .bind(item.quantity)
                    .execute(&self.pool),
            )
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_item(&self, id: ItemId) -> Result<u64, StoreError> {
        // ---
        let result = self
            .bounded(
                sqlx::query("DELETE FROM inventory_items WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;

        Ok(result.rows_affected())
    }

    async fn increment_quantity(&self, id: ItemId, delta: i64) -> Result<IncrementOutcome, StoreError> {
        // ---
        // One statement: the UPDATE re-checks its predicate against the latest
        // row version, so concurrent increments serialize on the row lock.
        let (current, updated): (Option<i64>, Option<i64>) = self
            .bounded(
                sqlx::query_as(
                    "WITH target AS (
                         SELECT quantity FROM inventory_items WHERE id = $1
                     ), applied AS (
                         UPDATE inventory_items SET quantity = quantity + $2
                         WHERE id = $1 AND quantity + $2 >= 0
                         RETURNING quantity
                     )
                     SELECT (SELECT quantity FROM target), (SELECT quantity FROM applied)",
                )
                .bind(id)
                .bind(delta)
                .fetch_one(&self.pool),
            )
            .await?;

        match (current, updated) {
            (_, Some(quantity)) => Ok(IncrementOutcome::Applied { quantity }),
            (None, None) => Ok(IncrementOutcome::NotFound),
            (Some(available), None) => {
                // `target` reads the statement snapshot, which can still hold a
                // row that a concurrent delete removed before the UPDATE ran.
                if self.find_item(id).await?.is_some() {
                    Ok(IncrementOutcome::Insufficient { available })
                } else {
                    Ok(IncrementOutcome::NotFound)
                }
            }
        }
    }
}
