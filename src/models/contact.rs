//! Retained "contact the team" messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContactMessage {
    pub id: i64,
    pub chat_id: i64,
    pub username: Option<String>,
    pub body: String,
    pub delivered: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContactMessage {
    pub chat_id: i64,
    pub username: Option<String>,
    pub body: String,
    pub delivered: bool,
}
