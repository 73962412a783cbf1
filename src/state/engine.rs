//! Per-chat serialization around the conversation machine
//!
//! Events for one chat are processed one at a time, start to finish, including
//! the session save. Different chats run independently.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, error};

use super::events::Event;
use super::machine::ConversationMachine;
use super::replies::Reply;
use super::session::Session;
use super::storage::SessionStore;
use crate::models::TelegramIdentity;
use crate::utils::errors::Result;

pub struct ConversationEngine {
    machine: ConversationMachine,
    sessions: Arc<dyn SessionStore>,
    ttl: Duration,
    locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl std::fmt::Debug for ConversationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationEngine")
            .field("machine", &self.machine)
            .field("ttl", &self.ttl)
            .field("active_chats", &self.active_chats())
            .finish_non_exhaustive()
    }
}

impl ConversationEngine {
    pub fn new(machine: ConversationMachine, sessions: Arc<dyn SessionStore>, ttl: Duration) -> Self {
        Self { machine, sessions, ttl, locks: DashMap::new() }
    }

    fn chat_lock(&self, chat_id: i64) -> Arc<Mutex<()>> {
        self.locks.entry(chat_id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Load the chat's session, or start a fresh one when it is missing or expired
    async fn load_session(&self, identity: &TelegramIdentity) -> Result<Session> {
        let mut session = match self.sessions.load(identity.chat_id).await? {
            Some(session) => session,
            None => {
                debug!(chat_id = identity.chat_id, "Starting a new session");
                Session::new(identity.chat_id)
            }
        };

        if identity.telegram_id.is_some() {
            session.telegram_user_id = identity.telegram_id;
        }
        if identity.username.is_some() {
            session.username = identity.username.clone();
        }
        Ok(session)
    }

    /// Handle one inbound event and return what the chat should be shown.
    ///
    /// Any failure inside the machine or the stores leaves the stored session
    /// exactly as it was and answers with a generic "try again later".
    pub async fn handle(&self, identity: &TelegramIdentity, language_code: Option<&str>, event: Event) -> Vec<Reply> {
        let chat_id = identity.chat_id;
        let lock = self.chat_lock(chat_id);
        let guard = lock.lock().await;

        let replies = match self.process(identity, language_code, event).await {
            Ok(replies) => replies,
            Err(e) => {
                error!(chat_id, error = %e, severity = %e.severity(), "Conversation step failed");
                vec![Reply::TryAgainLater]
            }
        };

        drop(guard);
        drop(lock);
        // The map holds one reference; anything more is a waiting event for this chat
        self.locks.remove_if(&chat_id, |_, lock| Arc::strong_count(lock) == 1);
        replies
    }

    /// Chats with an event in flight or waiting
    pub fn active_chats(&self) -> usize {
        self.locks.len()
    }

    async fn process(&self, identity: &TelegramIdentity, language_code: Option<&str>, event: Event) -> Result<Vec<Reply>> {
        let stored = self.load_session(identity).await?;
        let mut working = stored.clone();
        if let Some(code) = language_code {
            working.language_code = Some(code.to_string());
        }

        let replies = self.machine.handle(&mut working, identity, event).await?;

        working.touch(self.ttl);
        self.sessions.save(&working).await?;
        Ok(replies)
    }

    /// Current session for a chat, if one is stored
    pub async fn session(&self, chat_id: i64) -> Result<Option<Session>> {
        self.sessions.load(chat_id).await
    }

    /// Language the chat last used, for rendering
    pub async fn language_of(&self, chat_id: i64) -> Option<String> {
        match self.sessions.load(chat_id).await {
            Ok(session) => session.and_then(|s| s.language_code),
            Err(_) => None,
        }
    }
}
