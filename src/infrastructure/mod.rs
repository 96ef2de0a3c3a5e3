mod database;
mod memory;
pub mod metrics;

// Re-export the factory functions for easy access
pub use database::{
    create_postgres_repository, init_database_with_retry, probe_store, run_credential_migrations,
    run_inventory_migrations,
};
pub use memory::InMemoryStore;
pub use metrics::{create_noop_metrics, create_prom_metrics};
