//! Internationalization module
//!
//! Message catalogs for the chat surface, with language detection from the
//! Telegram client and fallback to the default language.

pub mod loader;

// Re-export commonly used i18n components
pub use loader::{I18n, LanguageStats, TranslationParams, TranslationStats};
