//! Message handlers module
//!
//! Free text in private chats feeds the active flow; everything else is ignored.

use teloxide::types::Message;
use teloxide::Bot;
use tracing::debug;

use super::process_event;
use crate::i18n::I18n;
use crate::state::{ConversationEngine, Event};
use crate::utils::errors::Result;

/// Handle incoming text messages
pub async fn handle_message(bot: Bot, msg: Message, engine: &ConversationEngine, i18n: &I18n) -> Result<()> {
    if !msg.chat.is_private() {
        return Ok(());
    }
    let (Some(user), Some(text)) = (msg.from.as_ref(), msg.text()) else {
        debug!(chat_id = msg.chat.id.0, "Non-text message ignored");
        return Ok(());
    };

    process_event(&bot, msg.chat.id, user, Event::Text(text.to_string()), engine, i18n).await
}
