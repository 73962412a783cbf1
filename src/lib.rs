//! RegistrationDesk Telegram Bot
//!
//! A Telegram assistant that registers people for competitions as players,
//! voters, viewers or advisers. This library provides the conversation state
//! machine, the profile and registration stores, the notification outbox and
//! a small admin API for reviewing requests and broadcasting messages.

#![allow(non_snake_case)]

pub mod api;
pub mod config;
pub mod database;
pub mod handlers;
pub mod i18n;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;
pub mod validation;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{RegistrationDeskError, Result};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use i18n::I18n;
pub use services::ServiceFactory;
pub use state::ConversationEngine;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
