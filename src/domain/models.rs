use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub type UserId = Uuid;
pub type ItemId = Uuid;

/// A stored account. Never updated or deleted once created.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    // ---
    pub id: UserId,
    pub username: String,

    /// bcrypt hash, including salt and cost.
    pub password_hash: String,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ---
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// Fields required to persist a new [`User`]; the store assigns the id.
#[derive(Clone)]
pub struct NewUser {
    // ---
    pub username: String,
    pub password_hash: String,
}

/// A stocked item as held by the Inventory Ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    // ---
    pub id: ItemId,
    pub name: String,
    pub quantity: i64,
}

/// Caller-supplied item fields for insert and full-replace update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFields {
    // ---
    pub name: String,
    pub quantity: i64,
}

impl ItemFields {
    // ---
    pub fn into_item(self, id: ItemId) -> InventoryItem {
        // ---
        InventoryItem {
            id,
            name: self.name,
            quantity: self.quantity,
        }
    }
}

/// Selection applied by a streamed scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemFilter {
    All,
    /// Regular expression matched against the item name.
    NamePattern(String),
}

/// Result of a conditional atomic quantity increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementOutcome {
    Applied { quantity: i64 },
    NotFound,
    /// The increment would have taken quantity below zero; nothing changed.
    Insufficient { available: i64 },
}
