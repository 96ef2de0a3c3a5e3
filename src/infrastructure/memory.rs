//! In-process store implementing both repository traits.
//!
//! Used by the test suites and for running a service without Postgres.
//! Every mutation happens under one write lock, which gives the same
//! single-record atomicity the Postgres statements provide.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use futures::StreamExt;
use regex::Regex;
use uuid::Uuid;

use crate::domain::{
    IncrementOutcome, InventoryItem, InventoryRepository, ItemFilter, ItemId, ItemStream, NewUser,
    StoreProbe, User, UserRepository,
};
use crate::error::StoreError;

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    // Insertion order is the scan order.
    items: Vec<InventoryItem>,
}

/// Shared, cloneable in-memory store.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    // ---
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    // ---
    pub fn new() -> Self {
        // ---
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, StoreError> {
        // ---
        self.tables
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>, StoreError> {
        // ---
        self.tables
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))
    }
}

#[async_trait::async_trait]
impl StoreProbe for InMemoryStore {
    // ---
    async fn ping(&self) -> Result<(), StoreError> {
        // ---
        self.read().map(|_| ())
    }
}

#[async_trait::async_trait]
impl UserRepository for InMemoryStore {
    // ---
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        // ---
        Ok(self.read()?.users.get(username).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        // ---
        let mut tables = self.write()?;
        if tables.users.contains_key(&user.username) {
            return Err(StoreError::UniqueViolation);
        }

        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            password_hash: user.password_hash,
        };
        tables.users.insert(user.username.clone(), user.clone());

        Ok(user)
    }
}

#[async_trait::async_trait]
impl InventoryRepository for InMemoryStore {
    // ---
    fn scan_items(&self, filter: ItemFilter) -> ItemStream {
        // ---
        let snapshot = match self.read() {
            Ok(tables) => tables.items.clone(),
            Err(err) => return futures::stream::iter([Err(err)]).boxed(),
        };

        let matched: Vec<Result<InventoryItem, StoreError>> = match filter {
            ItemFilter::All => snapshot.into_iter().map(Ok).collect(),
            ItemFilter::NamePattern(pattern) => match Regex::new(&pattern) {
                Ok(re) => snapshot
                    .into_iter()
                    .filter(|item| re.is_match(&item.name))
                    .map(Ok)
                    .collect(),
                Err(err) => vec![Err(StoreError::InvalidPattern(err.to_string()))],
            },
        };

        futures::stream::iter(matched).boxed()
    }

    async fn find_item(&self, id: ItemId) -> Result<Option<InventoryItem>, StoreError> {
        // ---
        Ok(self.read()?.items.iter().find(|item| item.id == id).cloned())
    }

    async fn insert_item(&self, name: String, quantity: i64) -> Result<ItemId, StoreError> {
        // ---
        let id = Uuid::new_v4();
        self.write()?.items.push(InventoryItem { id, name, quantity });
        Ok(id)
    }

    async fn update_item(&self, item: InventoryItem) -> Result<u64, StoreError> {
        // ---
        let mut tables = self.write()?;
        match tables.items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => {
                *existing = item;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_item(&self, id: ItemId) -> Result<u64, StoreError> {
        // ---
        let mut tables = self.write()?;
        let before = tables.items.len();
        tables.items.retain(|item| item.id != id);
        Ok((before - tables.items.len()) as u64)
    }

    async fn increment_quantity(&self, id: ItemId, delta: i64) -> Result<IncrementOutcome, StoreError> {
        // ---
        let mut tables = self.write()?;
        let Some(item) = tables.items.iter_mut().find(|item| item.id == id) else {
            return Ok(IncrementOutcome::NotFound);
        };

        let next = item.quantity.checked_add(delta).ok_or(StoreError::OutOfRange)?;
        if next < 0 {
            return Ok(IncrementOutcome::Insufficient {
                available: item.quantity,
            });
        }

        item.quantity = next;
        Ok(IncrementOutcome::Applied { quantity: next })
    }
}
