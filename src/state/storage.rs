//! Session storage implementations
//!
//! Sessions are kept in Redis in production (JSON value with a TTL) and in a
//! process-local map for tests and single-instance runs without Redis.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use redis::AsyncCommands;
use tracing::{debug, error, info, warn};

use super::session::Session;
use crate::config::RedisConfig;
use crate::utils::errors::Result;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// `Ok(None)` when absent or expired; expired sessions are removed
    async fn load(&self, chat_id: i64) -> Result<Option<Session>>;

    async fn save(&self, session: &Session) -> Result<()>;

    async fn delete(&self, chat_id: i64) -> Result<()>;
}

/// Redis-backed session store
#[derive(Clone)]
pub struct RedisSessionStore {
    connection_manager: redis::aio::ConnectionManager,
    config: RedisConfig,
    ttl: Duration,
}

impl RedisSessionStore {
    pub async fn new(config: RedisConfig, ttl: Duration) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())?;
        let connection_manager = redis::aio::ConnectionManager::new(client).await?;
        info!(prefix = %config.prefix, ttl_seconds = ttl.as_secs(), "Redis session store connected");

        Ok(Self { connection_manager, config, ttl })
    }

    fn session_key(&self, chat_id: i64) -> String {
        format!("{}session:{}", self.config.prefix, chat_id)
    }

    /// TTL for the Redis key: whatever is left of the session's own expiry, at least a minute
    fn key_ttl(&self, session: &Session) -> u64 {
        match session.remaining_ttl() {
            Some(seconds) => seconds.max(60) as u64,
            None => self.ttl.as_secs(),
        }
    }

    pub async fn test_connection(&self) -> Result<()> {
        let mut conn = self.connection_manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, chat_id: i64) -> Result<Option<Session>> {
        let key = self.session_key(chat_id);
        let mut conn = self.connection_manager.clone();

        let serialized = conn.get::<_, Option<String>>(&key).await.map_err(|e| {
            error!(chat_id, error = %e, "Failed to read session from Redis");
            e
        })?;

        let Some(data) = serialized else {
            debug!(chat_id, "No session stored");
            return Ok(None);
        };

        let session: Session = match serde_json::from_str(&data) {
            Ok(session) => session,
            Err(e) => {
                // Unreadable payloads are dropped so the chat can start over
                warn!(chat_id, error = %e, "Discarding undecodable session");
                self.delete(chat_id).await?;
                return Ok(None);
            }
        };

        if session.is_expired() {
            warn!(chat_id, expires_at = ?session.expires_at, "Session has expired, removing");
            self.delete(chat_id).await?;
            return Ok(None);
        }

        debug!(chat_id, state = %session.state, "Session loaded");
        Ok(Some(session))
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let key = self.session_key(session.chat_id);
        let serialized = serde_json::to_string(session)?;
        let ttl_seconds = self.key_ttl(session);
        let mut conn = self.connection_manager.clone();

        conn.set_ex::<_, _, ()>(&key, serialized, ttl_seconds).await.map_err(|e| {
            error!(chat_id = session.chat_id, error = %e, "Failed to save session to Redis");
            e
        })?;

        debug!(chat_id = session.chat_id, state = %session.state, ttl_seconds, "Session saved");
        Ok(())
    }

    async fn delete(&self, chat_id: i64) -> Result<()> {
        let key = self.session_key(chat_id);
        let mut conn = self.connection_manager.clone();
        let deleted: u32 = conn.del(&key).await?;
        debug!(chat_id, deleted, "Session deleted");
        Ok(())
    }
}

impl std::fmt::Debug for RedisSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSessionStore")
            .field("config", &self.config)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// Process-local session store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: DashMap<i64, Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, chat_id: i64) -> Result<Option<Session>> {
        let session = self.sessions.get(&chat_id).map(|entry| entry.value().clone());
        match session {
            Some(session) if session.is_expired() => {
                self.sessions.remove(&chat_id);
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn save(&self, session: &Session) -> Result<()> {
        self.sessions.insert(session.chat_id, session.clone());
        Ok(())
    }

    async fn delete(&self, chat_id: i64) -> Result<()> {
        self.sessions.remove(&chat_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::State;

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemorySessionStore::new();
        let mut session = Session::new(123);
        session.move_to(State::SelectCompetition).unwrap();
        session.touch(Duration::from_secs(600));

        store.save(&session).await.unwrap();
        let loaded = store.load(123).await.unwrap().unwrap();
        assert_eq!(loaded, session);

        store.delete(123).await.unwrap();
        assert!(store.load(123).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn memory_store_drops_expired_sessions() {
        let store = MemorySessionStore::new();
        let mut session = Session::new(456);
        session.set_expiry(chrono::Utc::now() - chrono::Duration::minutes(1));

        store.save(&session).await.unwrap();
        assert!(store.load(456).await.unwrap().is_none());
        assert!(store.is_empty());
    }
}
