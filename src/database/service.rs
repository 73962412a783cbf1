//! Database service layer
//!
//! This module provides a high-level interface to database operations

use std::sync::Arc;

use crate::database::repositories::{
    CompetitionRepository, ContactRepository, OutboxRepository, RegistrationRepository, SlotRepository,
    UserRepository,
};
use crate::database::store::Stores;
use crate::database::DatabasePool;

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub users: UserRepository,
    pub competitions: CompetitionRepository,
    pub registrations: RegistrationRepository,
    pub slots: SlotRepository,
    pub outbox: OutboxRepository,
    pub contacts: ContactRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            competitions: CompetitionRepository::new(pool.clone()),
            registrations: RegistrationRepository::new(pool.clone()),
            slots: SlotRepository::new(pool.clone()),
            outbox: OutboxRepository::new(pool.clone()),
            contacts: ContactRepository::new(pool),
        }
    }

    /// Expose the repositories through their store traits
    pub fn stores(&self) -> Stores {
        Stores {
            profiles: Arc::new(self.users.clone()),
            competitions: Arc::new(self.competitions.clone()),
            registrations: Arc::new(self.registrations.clone()),
            slots: Arc::new(self.slots.clone()),
            outbox: Arc::new(self.outbox.clone()),
            contacts: Arc::new(self.contacts.clone()),
        }
    }
}
