//! Command handlers module
//!
//! `/start` opens the main menu; `/cancel` abandons whatever flow is active.

use teloxide::types::Message;
use teloxide::utils::command::BotCommands;
use teloxide::Bot;
use tracing::debug;

use super::process_event;
use crate::i18n::I18n;
use crate::state::{ConversationEngine, Event};
use crate::utils::errors::Result;
use crate::utils::logging::log_user_action;

/// All available bot commands
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Registration desk commands:")]
pub enum Command {
    #[command(description = "Open the main menu")]
    Start,
    #[command(description = "Cancel the current action")]
    Cancel,
}

impl Command {
    fn event(&self) -> Event {
        match self {
            Command::Start => Event::Start,
            Command::Cancel => Event::Cancel,
        }
    }
}

/// Main command dispatcher
pub async fn handle_command(bot: Bot, msg: Message, cmd: Command, engine: &ConversationEngine, i18n: &I18n) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        debug!(chat_id = msg.chat.id.0, "Command without a sender ignored");
        return Ok(());
    };
    if !msg.chat.is_private() {
        return Ok(());
    }

    log_user_action(msg.chat.id.0, "command", Some(&format!("{cmd:?}").to_lowercase()));
    process_event(&bot, msg.chat.id, user, cmd.event(), engine, i18n).await
}
