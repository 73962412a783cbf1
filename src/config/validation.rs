//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use super::Settings;
use crate::utils::errors::{RegistrationDeskError, Result};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_database_config(&settings.database)?;
    validate_session_config(&settings.session)?;
    validate_outbox_config(&settings.outbox)?;
    validate_email_config(&settings.email)?;
    validate_i18n_config(&settings.i18n)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    if config.token.is_empty() {
        return Err(RegistrationDeskError::Config("Bot token is required".to_string()));
    }

    Ok(())
}

fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(RegistrationDeskError::Config("Database URL is required".to_string()));
    }

    if config.max_connections == 0 {
        return Err(RegistrationDeskError::Config(
            "Max connections must be greater than 0".to_string(),
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(RegistrationDeskError::Config(
            "Min connections cannot be greater than max connections".to_string(),
        ));
    }

    Ok(())
}

fn validate_session_config(config: &super::SessionConfig) -> Result<()> {
    if config.ttl_seconds < 60 {
        return Err(RegistrationDeskError::Config(
            "Session TTL must be at least 60 seconds".to_string(),
        ));
    }

    Ok(())
}

/// Validate outbox sweep parameters
fn validate_outbox_config(config: &super::OutboxConfig) -> Result<()> {
    if config.poll_seconds == 0 {
        return Err(RegistrationDeskError::Config(
            "Outbox poll interval must be greater than 0".to_string(),
        ));
    }

    if config.batch_size == 0 {
        return Err(RegistrationDeskError::Config(
            "Outbox batch size must be greater than 0".to_string(),
        ));
    }

    if config.max_attempts == 0 {
        return Err(RegistrationDeskError::Config(
            "Outbox max attempts must be greater than 0".to_string(),
        ));
    }

    if config.sends_per_second == 0 {
        return Err(RegistrationDeskError::Config(
            "Outbox send rate must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_email_config(config: &super::EmailConfig) -> Result<()> {
    if config.smtp_enabled() {
        if config.contact_recipients.is_empty() {
            return Err(RegistrationDeskError::Config(
                "At least one contact recipient is required when SMTP is configured".to_string(),
            ));
        }

        if config.from_address.is_empty() {
            return Err(RegistrationDeskError::Config(
                "Sender address is required when SMTP is configured".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_i18n_config(config: &super::I18nConfig) -> Result<()> {
    if config.default_language.is_empty() {
        return Err(RegistrationDeskError::Config("Default language is required".to_string()));
    }

    if !config.supported_languages.contains(&config.default_language) {
        return Err(RegistrationDeskError::Config(
            "Default language must be in supported languages list".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(RegistrationDeskError::Config(format!(
            "Invalid log level: {}. Valid levels: {:?}",
            config.level, valid_levels
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.bot.token = "123:abc".to_string();
        settings
    }

    #[test]
    fn default_settings_with_token_are_valid() {
        assert!(validate_settings(&valid_settings()).is_ok());
    }

    #[test]
    fn missing_token_is_rejected() {
        let settings = Settings::default();
        assert_matches!(validate_settings(&settings), Err(RegistrationDeskError::Config(_)));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let mut settings = valid_settings();
        settings.outbox.batch_size = 0;
        assert_matches!(validate_settings(&settings), Err(RegistrationDeskError::Config(msg)) if msg.contains("batch size"));
    }

    #[test]
    fn smtp_without_recipients_is_rejected() {
        let mut settings = valid_settings();
        settings.email.smtp_host = "smtp.example.com".to_string();
        assert!(validate_settings(&settings).is_err());

        settings.email.contact_recipients = vec!["team@example.com".to_string()];
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let mut settings = valid_settings();
        settings.logging.level = "verbose".to_string();
        assert!(validate_settings(&settings).is_err());
    }
}
