mod metrics;
mod models;
mod repository;

// Publicly expose the Metrics abstraction
pub use metrics::{Metrics, MetricsPtr};

// Records and persistence abstractions
pub use models::{
    IncrementOutcome, InventoryItem, ItemFields, ItemFilter, ItemId, NewUser, User, UserId,
};
pub use repository::{
    InventoryRepository, InventoryRepositoryPtr, ItemStream, StoreProbe, UserRepository,
    UserRepositoryPtr,
};
