// Gateway module - controls public API for handlers
// Modules are private, only exported symbols are public

mod credential;
mod health;
mod inventory;
mod metrics;
mod root;
mod shared_types;

// Core handlers
pub use health::health_check;
pub use metrics::{metrics_handler, track_requests};
pub use root::{credential_root_handler, inventory_root_handler};

// Credential Authority handlers
pub use credential::{authenticate, create_user, validate_token};

// Inventory Ledger handlers
pub use inventory::{
    delete_item, get_item, increment_item, insert_item, list_items, search_items, update_item,
};
