//! Callback query handlers module
//!
//! Button presses carry one of the tokens in [`crate::state::Token`]. Data
//! that does not decode is acknowledged and dropped.

use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, ChatId};
use tracing::{debug, warn};

use super::process_event;
use crate::i18n::I18n;
use crate::state::{ConversationEngine, Event};
use crate::utils::errors::Result;

/// Main callback query dispatcher
pub async fn handle_callback_query(bot: Bot, query: CallbackQuery, engine: &ConversationEngine, i18n: &I18n) -> Result<()> {
    // Clear the loading state on the button first
    if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
        warn!(error = %e, "Failed to answer callback query");
    }

    let user = &query.from;
    let chat_id = query
        .message
        .as_ref()
        .map(|m| m.chat().id)
        .unwrap_or_else(|| ChatId(user.id.0 as i64));

    let Some(data) = query.data.as_deref() else {
        return Ok(());
    };
    let Some(event) = Event::from_callback(data) else {
        debug!(chat_id = chat_id.0, data, "Unknown callback data dropped");
        return Ok(());
    };

    process_event(&bot, chat_id, user, event, engine, i18n).await
}
