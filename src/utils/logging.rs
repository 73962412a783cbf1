//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the RegistrationDesk application.

use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::utils::errors::Result;

/// Initialize logging based on configuration.
///
/// `RUST_LOG` takes precedence over the configured level. The returned guard
/// flushes the file writer and must be held until shutdown.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.directory, "registration-desk.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().json().with_writer(non_blocking))
        .init();

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log user actions with structured data
pub fn log_user_action(chat_id: i64, action: &str, details: Option<&str>) {
    info!(chat_id = chat_id, action = action, details = details, "User action performed");
}

/// Log a conversation state change
pub fn log_state_transition(chat_id: i64, from: &str, to: &str) {
    debug!(chat_id = chat_id, from = from, to = to, "Conversation state changed");
}

/// Log profile field edits
pub fn log_profile_change(user_id: i64, field: &str) {
    info!(user_id = user_id, field = field, "Profile field changed");
}

/// Log the outcome of one outbox delivery attempt
pub fn log_outbox_result(item_id: i64, chat_id: i64, attempts: i32, outcome: &str, error: Option<&str>) {
    if error.is_some() {
        warn!(
            item_id = item_id,
            chat_id = chat_id,
            attempts = attempts,
            outcome = outcome,
            error = error,
            "Outbox delivery failed"
        );
    } else {
        debug!(item_id = item_id, chat_id = chat_id, attempts = attempts, "Outbox item delivered");
    }
}

/// Log admin review actions
pub fn log_review_action(request_id: i64, action: &str, reviewer: Option<i64>, details: Option<&str>) {
    warn!(
        request_id = request_id,
        action = action,
        reviewer = reviewer,
        details = details,
        "Registration request reviewed"
    );
}
