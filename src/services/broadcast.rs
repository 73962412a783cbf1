//! Broadcasts to registered users
//!
//! Telegram messages are only queued in the outbox; the dispatcher delivers
//! them. Email goes out directly through the [`Mailer`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::email::Mailer;
use crate::database::{OutboxStore, ProfileStore};
use crate::models::{NewOutboxItem, Role};
use crate::utils::errors::{RegistrationDeskError, Result};

pub const DEFAULT_SUBJECT: &str = "Уведомление";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Tg,
    Email,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyRequest {
    pub message: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    /// Empty means every channel
    #[serde(default)]
    pub channels: Vec<Channel>,
}

impl NotifyRequest {
    fn wants(&self, channel: Channel) -> bool {
        self.channels.is_empty() || self.channels.contains(&channel)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelResult {
    pub channel: Channel,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queued: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientResult {
    pub id: i64,
    pub chat_id: i64,
    pub email: Option<String>,
    pub ok: bool,
    pub details: Vec<ChannelResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyReport {
    pub count: usize,
    pub tg_enqueued: usize,
    pub results: Vec<RecipientResult>,
}

#[derive(Clone)]
pub struct BroadcastService {
    profiles: Arc<dyn ProfileStore>,
    outbox: Arc<dyn OutboxStore>,
    mailer: Arc<dyn Mailer>,
}

impl std::fmt::Debug for BroadcastService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastService").finish_non_exhaustive()
    }
}

impl BroadcastService {
    pub fn new(profiles: Arc<dyn ProfileStore>, outbox: Arc<dyn OutboxStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self { profiles, outbox, mailer }
    }

    /// Send `message` to every user (optionally only those with `role`).
    ///
    /// A failure for one user or channel is reported in that user's result
    /// and does not stop the broadcast.
    pub async fn notify(&self, request: NotifyRequest) -> Result<NotifyReport> {
        if request.message.trim().is_empty() {
            return Err(RegistrationDeskError::InvalidInput("message required".to_string()));
        }

        let subject = request.subject.clone().unwrap_or_else(|| DEFAULT_SUBJECT.to_string());
        let users = self.profiles.list_users(request.role).await?;
        let mut results = Vec::with_capacity(users.len());
        let mut tg_enqueued = 0;

        for user in users {
            let mut details = Vec::new();

            if request.wants(Channel::Tg) {
                let queued = self
                    .outbox
                    .enqueue(NewOutboxItem { user_id: Some(user.id), chat_id: user.chat_id, message: request.message.clone() })
                    .await;
                match queued {
                    Ok(_) => {
                        tg_enqueued += 1;
                        details.push(ChannelResult { channel: Channel::Tg, ok: true, queued: Some(true), error: None });
                    }
                    Err(e) => {
                        warn!(user_id = user.id, error = %e, "Failed to queue broadcast message");
                        details.push(ChannelResult {
                            channel: Channel::Tg,
                            ok: false,
                            queued: None,
                            error: Some(e.to_string()),
                        });
                    }
                }
            }

            if let (true, Some(email)) = (request.wants(Channel::Email), user.email.as_ref()) {
                match self.mailer.send(std::slice::from_ref(email), &subject, &request.message).await {
                    Ok(()) => details.push(ChannelResult { channel: Channel::Email, ok: true, queued: None, error: None }),
                    Err(e) => {
                        warn!(user_id = user.id, error = %e, "Failed to email broadcast message");
                        details.push(ChannelResult {
                            channel: Channel::Email,
                            ok: false,
                            queued: None,
                            error: Some(e.to_string()),
                        });
                    }
                }
            }

            results.push(RecipientResult {
                id: user.id,
                chat_id: user.chat_id,
                email: user.email.clone(),
                ok: details.iter().all(|d| d.ok),
                details,
            });
        }

        info!(recipients = results.len(), tg_enqueued, role = ?request.role, "Broadcast processed");
        Ok(NotifyReport { count: results.len(), tg_enqueued, results })
    }
}
