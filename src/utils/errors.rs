//! Error handling for RegistrationDesk
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for RegistrationDesk application
#[derive(Error, Debug)]
pub enum RegistrationDeskError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Email error: {0}")]
    Email(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: i64 },

    #[error("Competition not found: {competition_id}")]
    CompetitionNotFound { competition_id: i64 },

    #[error("Registration request not found: {request_id}")]
    RegistrationRequestNotFound { request_id: i64 },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Review rejected: {0}")]
    Review(#[from] ReviewError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Reasons an administrative review action is refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("only pending requests can be approved (current status: {status})")]
    NotPending { status: String },

    #[error("only pending or approved requests can be rejected (current status: {status})")]
    NotRejectable { status: String },
}

/// Delivery failure reported by an outbound message transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

/// Result type alias for RegistrationDesk operations
pub type Result<T> = std::result::Result<T, RegistrationDeskError>;

impl From<lettre::error::Error> for RegistrationDeskError {
    fn from(err: lettre::error::Error) -> Self {
        RegistrationDeskError::Email(err.to_string())
    }
}

impl From<lettre::address::AddressError> for RegistrationDeskError {
    fn from(err: lettre::address::AddressError) -> Self {
        RegistrationDeskError::Email(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for RegistrationDeskError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        RegistrationDeskError::Email(err.to_string())
    }
}

impl RegistrationDeskError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            RegistrationDeskError::Database(_) => false,
            RegistrationDeskError::Migration(_) => false,
            RegistrationDeskError::Telegram(_) => true,
            RegistrationDeskError::Redis(_) => true,
            RegistrationDeskError::Serialization(_) => false,
            RegistrationDeskError::Io(_) => true,
            RegistrationDeskError::Email(_) => true,
            RegistrationDeskError::Config(_) => false,
            RegistrationDeskError::UserNotFound { .. } => false,
            RegistrationDeskError::CompetitionNotFound { .. } => false,
            RegistrationDeskError::RegistrationRequestNotFound { .. } => false,
            RegistrationDeskError::InvalidStateTransition { .. } => false,
            RegistrationDeskError::Review(_) => false,
            RegistrationDeskError::InvalidInput(_) => false,
            RegistrationDeskError::ServiceUnavailable(_) => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RegistrationDeskError::Database(_) => ErrorSeverity::Critical,
            RegistrationDeskError::Migration(_) => ErrorSeverity::Critical,
            RegistrationDeskError::Config(_) => ErrorSeverity::Critical,
            RegistrationDeskError::InvalidStateTransition { .. } => ErrorSeverity::Critical,
            RegistrationDeskError::Review(_) => ErrorSeverity::Warning,
            RegistrationDeskError::InvalidInput(_) => ErrorSeverity::Info,
            RegistrationDeskError::UserNotFound { .. }
            | RegistrationDeskError::CompetitionNotFound { .. }
            | RegistrationDeskError::RegistrationRequestNotFound { .. } => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_errors_are_not_recoverable() {
        let err: RegistrationDeskError = ReviewError::NotPending { status: "approved".into() }.into();
        assert!(!err.is_recoverable());
        assert_eq!(err.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn transient_backends_are_recoverable() {
        assert!(RegistrationDeskError::Email("smtp down".into()).is_recoverable());
        assert!(RegistrationDeskError::ServiceUnavailable("redis".into()).is_recoverable());
        assert!(!RegistrationDeskError::Config("bad".into()).is_recoverable());
    }

    #[test]
    fn delivery_error_display() {
        let err = DeliveryError::RateLimited { retry_after_secs: 5 };
        assert_eq!(err.to_string(), "rate limited, retry after 5s");
    }
}
