//! Test helpers module
//!
//! Utilities shared by the integration tests: an in-memory test context,
//! recording doubles for the mail and chat transports, and a mock Bot API.

#![allow(dead_code)]

pub mod doubles;
pub mod telegram_mock;
pub mod test_context;

pub use doubles::*;
pub use telegram_mock::*;
pub use test_context::*;
