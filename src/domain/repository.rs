use super::models::{IncrementOutcome, InventoryItem, ItemFilter, ItemId, NewUser, User};
use crate::error::StoreError;
use futures::stream::BoxStream;
use std::sync::Arc;

/// Items delivered one at a time by a scan. Ends after the first error.
pub type ItemStream = BoxStream<'static, Result<InventoryItem, StoreError>>;

/// Liveness check against the backing store.
#[async_trait::async_trait]
pub trait StoreProbe: Send + Sync {
    // ---
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Persistence for Credential Authority user records.
#[async_trait::async_trait]
pub trait UserRepository: StoreProbe {
    // ---
    /// Get user by username.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Insert a new user. Fails with [`StoreError::UniqueViolation`] if the
    /// username is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;
}

/// Persistence for Inventory Ledger item records.
#[async_trait::async_trait]
pub trait InventoryRepository: StoreProbe {
    // ---
    /// Stream every item matching `filter`. Calling again starts a new scan.
    fn scan_items(&self, filter: ItemFilter) -> ItemStream;

    async fn find_item(&self, id: ItemId) -> Result<Option<InventoryItem>, StoreError>;

    async fn insert_item(&self, name: String, quantity: i64) -> Result<ItemId, StoreError>;

    /// Full-field replace keyed by `item.id`. Returns the number of rows changed.
    async fn update_item(&self, item: InventoryItem) -> Result<u64, StoreError>;

    async fn delete_item(&self, id: ItemId) -> Result<u64, StoreError>;

    /// Apply `quantity += delta` in one atomic store operation, only if the
    /// result stays non-negative.
    async fn increment_quantity(&self, id: ItemId, delta: i64) -> Result<IncrementOutcome, StoreError>;
}

/// Type alias for any backend that implements UserRepository.
pub type UserRepositoryPtr = Arc<dyn UserRepository>;

/// Type alias for any backend that implements InventoryRepository.
pub type InventoryRepositoryPtr = Arc<dyn InventoryRepository>;
