//! Database module
//!
//! This module handles database connections, repositories and the store
//! traits the rest of the application depends on

pub mod connection;
pub mod memory;
pub mod repositories;
pub mod service;
pub mod store;

// Re-export commonly used database components
pub use connection::{create_pool, health_check, run_migrations, DatabasePool};
pub use memory::MemoryStore;
pub use repositories::{
    CompetitionRepository, ContactRepository, OutboxRepository, RegistrationRepository, SlotRepository,
    UserRepository,
};
pub use service::DatabaseService;
pub use store::{
    CompetitionStore, ContactStore, OutboxStore, ProfileStore, RegistrationStore, SlotStore, Stores,
};
