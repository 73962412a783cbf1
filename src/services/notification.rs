//! Chat notification transport
//!
//! The outbox dispatcher and the broadcast service only need "send this text
//! to that chat" plus a classification of why it failed. [`TelegramNotifier`]
//! provides that over teloxide.

use async_trait::async_trait;
use teloxide::prelude::Request;
use teloxide::requests::Requester;
use teloxide::types::ChatId;
use teloxide::{Bot, RequestError};
use tracing::{debug, warn};

use crate::utils::errors::DeliveryError;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError>;
}

/// Map a Bot API failure onto the retry classes the dispatcher understands
pub fn classify_request_error(error: &RequestError) -> DeliveryError {
    match error {
        RequestError::RetryAfter(seconds) => DeliveryError::RateLimited {
            retry_after_secs: u64::from(seconds.seconds()),
        },
        RequestError::Api(api) => DeliveryError::Transport(api.to_string()),
        RequestError::Network(err) => DeliveryError::Transport(err.to_string()),
        RequestError::MigrateToChatId(chat) => {
            DeliveryError::Transport(format!("group migrated to chat {}", chat.0))
        }
        other => DeliveryError::Unexpected(other.to_string()),
    }
}

#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier").finish_non_exhaustive()
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError> {
        match self.bot.send_message(ChatId(chat_id), text).send().await {
            Ok(_) => {
                debug!(chat_id, "Notification delivered");
                Ok(())
            }
            Err(e) => {
                let classified = classify_request_error(&e);
                warn!(chat_id, error = %e, class = ?classified, "Notification delivery failed");
                Err(classified)
            }
        }
    }
}
