//! Notification outbox model

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{text_column, UnknownVariant};

/// Stored `last_error` text is cut to this many characters
pub const MAX_ERROR_CHARS: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutboxStatus {
    Pending,
    Sent,
    Failed,
}

impl OutboxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxStatus::Pending => "pending",
            OutboxStatus::Sent => "sent",
            OutboxStatus::Failed => "failed",
        }
    }
}

impl FromStr for OutboxStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OutboxStatus::Pending),
            "sent" => Ok(OutboxStatus::Sent),
            "failed" => Ok(OutboxStatus::Failed),
            other => Err(UnknownVariant { kind: "outbox status", value: other.to_string() }),
        }
    }
}

text_column!(OutboxStatus);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct OutboxItem {
    pub id: i64,
    pub user_id: Option<i64>,
    pub chat_id: i64,
    pub message: String,
    pub status: OutboxStatus,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOutboxItem {
    pub user_id: Option<i64>,
    pub chat_id: i64,
    pub message: String,
}

/// Result of a failed attempt, written back in one update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxFailure {
    pub attempts: i32,
    pub status: OutboxStatus,
    pub last_error: String,
}
