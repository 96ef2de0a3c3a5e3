//! Inventory Ledger: item storage and quantity mutation.

use crate::domain::{
    IncrementOutcome, InventoryItem, InventoryRepositoryPtr, ItemFields, ItemFilter, ItemId,
    MetricsPtr, StoreProbe,
};
use crate::error::{ServiceError, StoreError};
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use regex::Regex;
use uuid::Uuid;

/// Items streamed to a caller; the stream ends after the first error.
pub type ItemResultStream = BoxStream<'static, Result<InventoryItem, ServiceError>>;

/// Owns the item store handle for the lifetime of the process.
pub struct InventoryLedger {
    // ---
    items: InventoryRepositoryPtr,
    metrics: MetricsPtr,
}

fn parse_item_id(id: &str) -> Result<ItemId, ServiceError> {
    // ---
    Uuid::parse_str(id).map_err(|_| ServiceError::validation(format!("'{id}' is not a valid item id")))
}

fn check_quantity(quantity: i64) -> Result<(), ServiceError> {
    // ---
    if quantity < 0 {
        return Err(ServiceError::validation("quantity must not be negative"));
    }
    Ok(())
}

fn map_scan_error(err: StoreError) -> ServiceError {
    // ---
    match err {
        StoreError::InvalidPattern(detail) => {
            ServiceError::validation(format!("invalid name pattern: {detail}"))
        }
        other => other.into(),
    }
}

fn map_mutation_error(err: StoreError) -> ServiceError {
    // ---
    match err {
        StoreError::OutOfRange => ServiceError::validation("quantity out of range"),
        other => other.into(),
    }
}

impl InventoryLedger {
    // ---
    pub fn new(items: InventoryRepositoryPtr, metrics: MetricsPtr) -> Self {
        // ---
        Self { items, metrics }
    }

    /// Streams every item. Call again to re-scan.
    pub fn get_all(&self) -> ItemResultStream {
        // ---
        tracing::debug!("Streaming all items");
        self.items
            .scan_items(ItemFilter::All)
            .map_err(ServiceError::from)
            .boxed()
    }

    /// Looks up one item.
    ///
    /// # Errors
    /// `Validation` for a malformed id, `NotFound` if no such item exists.
    #[tracing::instrument(skip(self))]
    pub async fn find_by_id(&self, id: &str) -> Result<InventoryItem, ServiceError> {
        // ---
        let item_id = parse_item_id(id)?;

        self.items
            .find_item(item_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("item {item_id}")))
    }

    /// Streams items whose name matches `pattern` (a regular expression;
    /// a plain word matches as a substring). No match is an empty stream.
    ///
    /// The pattern is checked with `regex` first; a store that still rejects
    /// it fails the stream with `Validation`.
    #[tracing::instrument(skip(self))]
    pub fn find_by_name_pattern(&self, pattern: &str) -> Result<ItemResultStream, ServiceError> {
        // ---
        if pattern.is_empty() {
            return Err(ServiceError::validation("name pattern is required"));
        }
        Regex::new(pattern)
            .map_err(|e| ServiceError::validation(format!("invalid name pattern: {e}")))?;

        Ok(self
            .items
            .scan_items(ItemFilter::NamePattern(pattern.to_string()))
            .map_err(map_scan_error)
            .boxed())
    }

    /// Stores a new item and returns its fresh id.
    #[tracing::instrument(skip(self))]
    pub async fn insert(&self, fields: ItemFields) -> Result<ItemId, ServiceError> {
        // ---
        check_quantity(fields.quantity)?;

        let id = self.items.insert_item(fields.name, fields.quantity).await?;
        tracing::info!(item_id = %id, "Inserted item");

        Ok(id)
    }

    /// Replaces every field of item `id`. Returns 0 when no such item exists.
    #[tracing::instrument(skip(self))]
    pub async fn update(&self, id: &str, fields: ItemFields) -> Result<u64, ServiceError> {
        // ---
        check_quantity(fields.quantity)?;

        // A malformed id cannot name a stored item.
        let Ok(item_id) = Uuid::parse_str(id) else {
            tracing::debug!("Update for malformed id matches nothing");
            return Ok(0);
        };

        let count = self
            .items
            .update_item(fields.into_item(item_id))
            .await
            .map_err(map_mutation_error)?;
        tracing::info!(count, "Updated item");

        Ok(count)
    }

    /// Removes item `id`. Returns 0 when no such item exists.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<u64, ServiceError> {
        // ---
        let Ok(item_id) = Uuid::parse_str(id) else {
            tracing::debug!("Delete for malformed id matches nothing");
            return Ok(0);
        };

        let count = self.items.delete_item(item_id).await?;
        tracing::info!(count, "Deleted item");

        Ok(count)
    }

    /// Atomically applies `quantity += delta`; negative deltas are purchases.
    ///
    /// # Errors
    /// - `Validation` for a malformed id or an overflowing result
    /// - `InsufficientStock` if the result would drop below zero; the stored
    ///   quantity is left unchanged
    #[tracing::instrument(skip(self))]
    pub async fn increment_quantity(&self, id: &str, delta: i64) -> Result<u64, ServiceError> {
        // ---
        let item_id = parse_item_id(id)?;

        let outcome = self
            .items
            .increment_quantity(item_id, delta)
            .await
            .map_err(map_mutation_error)?;

        match outcome {
            IncrementOutcome::Applied { quantity } => {
                self.metrics.record_quantity_change(delta, true);
                tracing::info!(quantity, "Applied quantity change");
                Ok(1)
            }
            IncrementOutcome::NotFound => {
                tracing::debug!("Quantity change for unknown item");
                Ok(0)
            }
            IncrementOutcome::Insufficient { available } => {
                self.metrics.record_quantity_change(delta, false);
                tracing::warn!(available, "Refused quantity change below zero");
                Err(ServiceError::InsufficientStock {
                    id: item_id.to_string(),
                    available,
                })
            }
        }
    }
}

#[async_trait::async_trait]
impl StoreProbe for InventoryLedger {
    // ---
    async fn ping(&self) -> Result<(), StoreError> {
        // ---
        self.items.ping().await
    }
}
