//! "Contact the team": forward one free-text message by email

use tracing::warn;

use super::{ConversationMachine, Transition};
use crate::models::NewContactMessage;
use crate::state::replies::{Prompt, Reply};
use crate::state::session::Session;
use crate::utils::errors::Result;
use crate::utils::helpers::or_dash;
use crate::utils::logging::log_user_action;
use crate::validation::parse_required;

const DEFAULT_SUBJECT: &str = "USN contact message";

fn sender_handle(session: &Session) -> String {
    match (&session.username, session.telegram_user_id) {
        (Some(username), _) => username.clone(),
        (None, Some(id)) => id.to_string(),
        (None, None) => session.chat_id.to_string(),
    }
}

impl ConversationMachine {
    pub(super) async fn submit_contact_message(&self, session: &mut Session, text: &str) -> Result<Transition> {
        let text = match parse_required(text) {
            Ok(text) => text,
            Err(e) => {
                return Ok(Transition::stay(
                    session,
                    vec![Reply::invalid(e), Reply::ask(Prompt::ContactMessage)],
                ))
            }
        };

        let prefix = if self.contact.subject.is_empty() { DEFAULT_SUBJECT } else { self.contact.subject.as_str() };
        let subject = format!("{prefix} from @{}", sender_handle(session));
        let body = format!(
            "From: @{} (id: {}, chat_id: {})\n\n{}",
            or_dash(session.username.as_deref()),
            session.telegram_user_id.map(|id| id.to_string()).unwrap_or_else(|| "—".to_string()),
            session.chat_id,
            text
        );

        let delivered = match self.mailer.send(&self.contact.recipients, &subject, &body).await {
            Ok(()) => true,
            Err(e) => {
                warn!(chat_id = session.chat_id, error = %e, "Contact message not delivered");
                false
            }
        };

        let recorded = self
            .stores
            .contacts
            .record_contact_message(NewContactMessage {
                chat_id: session.chat_id,
                username: session.username.clone(),
                body: text,
                delivered,
            })
            .await;
        match recorded {
            Ok(_) => {}
            // A delivered email is never resent
            Err(e) if delivered => {
                warn!(chat_id = session.chat_id, error = %e, "Delivered contact message was not recorded");
            }
            Err(e) => return Err(e),
        }

        log_user_action(session.chat_id, "contact_message", Some(if delivered { "delivered" } else { "failed" }));

        let reply = if delivered { Reply::ContactDelivered } else { Reply::ContactFailed };
        Ok(Transition::idle(vec![reply]))
    }
}
