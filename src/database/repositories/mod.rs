//! Database repositories module
//!
//! One repository per aggregate, each implementing its store trait over PostgreSQL

pub mod competition;
pub mod contact;
pub mod outbox;
pub mod registration;
pub mod slot;
pub mod user;

pub use competition::CompetitionRepository;
pub use contact::ContactRepository;
pub use outbox::OutboxRepository;
pub use registration::RegistrationRepository;
pub use slot::SlotRepository;
pub use user::UserRepository;
