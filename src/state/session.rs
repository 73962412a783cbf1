//! Per-chat conversation session
//!
//! A typed record of everything one chat's conversation has collected so far.
//! Sessions are created on the first event from a chat, reset whenever the
//! conversation returns to [`State::Idle`], and expire after the configured TTL.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::transitions::State;
use crate::models::{EditableField, ProfileDraft, Role};
use crate::utils::errors::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub chat_id: i64,
    pub telegram_user_id: Option<i64>,
    pub username: Option<String>,
    pub language_code: Option<String>,
    pub state: State,

    pub role: Option<Role>,
    pub competition_id: Option<i64>,
    pub competition_name: Option<String>,
    /// Profile shown on the confirmation screen
    pub profile_id: Option<i64>,
    pub draft: ProfileDraft,

    pub slot_date: Option<NaiveDate>,
    pub slot_start: Option<NaiveTime>,
    pub slot_end: Option<NaiveTime>,

    pub first_cert_answer: Option<bool>,
    pub second_cert_answer: Option<bool>,
    pub edit_field: Option<EditableField>,

    pub expires_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Session {
    pub fn new(chat_id: i64) -> Self {
        Self {
            chat_id,
            telegram_user_id: None,
            username: None,
            language_code: None,
            state: State::Idle,
            role: None,
            competition_id: None,
            competition_name: None,
            profile_id: None,
            draft: ProfileDraft::default(),
            slot_date: None,
            slot_start: None,
            slot_end: None,
            first_cert_answer: None,
            second_cert_answer: None,
            edit_field: None,
            expires_at: None,
            updated_at: Utc::now(),
        }
    }

    /// Back to `Idle` with every draft field discarded; chat identity is kept
    pub fn reset(&mut self) {
        let mut fresh = Session::new(self.chat_id);
        fresh.telegram_user_id = self.telegram_user_id;
        fresh.username = self.username.take();
        fresh.language_code = self.language_code.take();
        fresh.expires_at = self.expires_at;
        *self = fresh;
    }

    /// Move along a table edge; entering `Idle` resets the session
    pub fn move_to(&mut self, next: State) -> Result<()> {
        self.state.check_move(next)?;
        if next == State::Idle {
            self.reset();
        } else {
            self.state = next;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|expires_at| Utc::now() > expires_at)
    }

    /// Push the expiry out by `ttl` from now
    pub fn touch(&mut self, ttl: std::time::Duration) {
        let ttl = Duration::from_std(ttl).unwrap_or_else(|_| Duration::hours(24));
        let now = Utc::now();
        self.expires_at = Some(now + ttl);
        self.updated_at = now;
    }

    pub fn set_expiry(&mut self, expires_at: DateTime<Utc>) {
        self.expires_at = Some(expires_at);
    }

    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    /// Seconds left before expiry, if an expiry is set
    pub fn remaining_ttl(&self) -> Option<i64> {
        self.expires_at.map(|expires_at| (expires_at - Utc::now()).num_seconds())
    }
}
