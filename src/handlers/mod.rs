//! Bot handlers module
//!
//! Thin Telegram glue around [`ConversationEngine`]:
//! - command handlers for `/start` and `/cancel`
//! - callback handlers for inline keyboard buttons
//! - message handlers for free text
//!
//! Every handler turns its update into an [`Event`], runs it through the
//! engine and renders the replies in the chat's language.

pub mod callbacks;
pub mod commands;
pub mod keyboards;
pub mod messages;
pub mod render;

use teloxide::prelude::*;
use teloxide::types::{ChatId, User};
use tracing::debug;

use crate::i18n::I18n;
use crate::models::TelegramIdentity;
use crate::state::{ConversationEngine, Event, Reply};
use crate::utils::errors::Result;

pub use callbacks::handle_callback_query;
pub use commands::{handle_command, Command};
pub use messages::handle_message;
pub use render::{render, Rendered};

/// Identity of the Telegram account behind `chat_id`
pub fn identity_of(chat_id: ChatId, user: &User) -> TelegramIdentity {
    TelegramIdentity {
        chat_id: chat_id.0,
        telegram_id: i64::try_from(user.id.0).ok(),
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()),
        last_name: user.last_name.clone(),
    }
}

/// Send each reply as its own message, in order
pub async fn send_replies(bot: &Bot, chat_id: ChatId, replies: &[Reply], i18n: &I18n, lang: &str) -> Result<()> {
    for reply in replies {
        let rendered = render(reply, i18n, lang);
        let request = bot.send_message(chat_id, rendered.text);
        match rendered.keyboard {
            Some(keyboard) => request.reply_markup(keyboard).await?,
            None => request.await?,
        };
    }
    Ok(())
}

/// Run one event for `user` in `chat_id` and deliver the replies
pub async fn process_event(
    bot: &Bot,
    chat_id: ChatId,
    user: &User,
    event: Event,
    engine: &ConversationEngine,
    i18n: &I18n,
) -> Result<()> {
    let identity = identity_of(chat_id, user);
    let lang = i18n.detect_user_language(user.language_code.as_deref());

    debug!(chat_id = chat_id.0, event = event.kind(), lang = %lang, "Processing event");
    let replies = engine.handle(&identity, Some(&lang), event).await;
    send_replies(bot, chat_id, &replies, i18n, &lang).await
}
