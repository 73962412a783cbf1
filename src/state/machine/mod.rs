//! Conversation state machine
//!
//! [`ConversationMachine::handle`] consumes one event for one session: it
//! dispatches on (state, event), lets the step handler update the session and
//! call the stores, then moves the session along the transition table.
//! Step handlers live in the sibling modules, one per flow.

mod contact;
mod edit;
mod new_user;
mod registration;
mod slot;

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use super::events::{Event, Token};
use super::replies::{Prompt, Reply};
use super::session::Session;
use super::transitions::State;
use crate::database::Stores;
use crate::models::TelegramIdentity;
use crate::services::email::Mailer;
use crate::utils::errors::Result;
use crate::utils::logging::log_state_transition;

/// Next state plus the replies to show on the way there
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: State,
    pub replies: Vec<Reply>,
}

impl Transition {
    pub fn to(next: State, replies: Vec<Reply>) -> Self {
        Self { next, replies }
    }

    /// Re-prompt without moving
    pub fn stay(session: &Session, replies: Vec<Reply>) -> Self {
        Self { next: session.state, replies }
    }

    /// Back to the main menu
    pub fn idle(mut replies: Vec<Reply>) -> Self {
        replies.push(Reply::MainMenu);
        Self { next: State::Idle, replies }
    }
}

/// Where "contact the team" messages go
#[derive(Debug, Clone, Default)]
pub struct ContactSettings {
    pub recipients: Vec<String>,
    pub subject: String,
}

pub struct ConversationMachine {
    stores: Stores,
    mailer: Arc<dyn Mailer>,
    contact: ContactSettings,
    today: fn() -> NaiveDate,
}

impl std::fmt::Debug for ConversationMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationMachine")
            .field("contact", &self.contact)
            .finish_non_exhaustive()
    }
}

fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

impl ConversationMachine {
    pub fn new(stores: Stores, mailer: Arc<dyn Mailer>, contact: ContactSettings) -> Self {
        Self { stores, mailer, contact, today: utc_today }
    }

    /// Override the clock used for birth-date checks
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Run one event against the session. On `Err` the caller must discard
    /// the session changes; nothing has been committed to the state.
    pub async fn handle(&self, session: &mut Session, identity: &TelegramIdentity, event: Event) -> Result<Vec<Reply>> {
        let from = session.state;

        let transition = match event {
            Event::Start => self.start(identity).await?,
            Event::Cancel => Transition::idle(vec![Reply::Cancelled]),
            Event::Text(text) => self.on_text(session, text).await?,
            Event::Button(token) => self.on_button(session, token).await?,
        };

        session.move_to(transition.next)?;
        if from != session.state {
            log_state_transition(session.chat_id, from.as_str(), session.state.as_str());
        }

        Ok(transition.replies)
    }

    async fn start(&self, identity: &TelegramIdentity) -> Result<Transition> {
        self.stores.profiles.get_or_create_by_chat(identity).await?;
        Ok(Transition::to(State::Idle, vec![Reply::MainMenu]))
    }

    async fn on_text(&self, session: &mut Session, text: String) -> Result<Transition> {
        use State::*;
        match session.state {
            Idle => Ok(Transition::stay(session, vec![Reply::UseMenu])),
            ContactMessage => self.submit_contact_message(session, &text).await,
            NewUserFirstName | NewUserLastName | NewUserPhone | NewUserEmail | NewUserBirthDate | NewUserChannel
            | NewUserCountry | NewUserCity | NewUserSchool | NewUserCertificateName | NewUserCompany
            | NewUserPosition | NewUserLateCertificateName | NewUserImportantInfo => {
                self.new_user_text(session, &text).await
            }
            EditValue => self.apply_edit(session, &text).await,
            VoterSlotDate | VoterSlotStart | VoterSlotEnd => self.slot_text(session, &text).await,
            SelectCompetition | SelectRole | NewUserCertificateNow | NewUserCertificateLater | ConfirmData
            | EditFieldSelect | MoreEdits => Ok(Transition::stay(session, vec![Reply::UseButtons])),
        }
    }

    async fn on_button(&self, session: &mut Session, token: Token) -> Result<Transition> {
        match (session.state, token) {
            (State::Idle, Token::Register) => self.begin_registration(session).await,
            (State::Idle, Token::Contact) => Ok(Transition::to(
                State::ContactMessage,
                vec![Reply::ask(Prompt::ContactMessage)],
            )),
            (State::SelectCompetition, Token::Competition(id)) => self.select_competition(session, id).await,
            (State::SelectRole, Token::Role(role)) => self.select_role(session, role).await,
            (State::NewUserCertificateNow, Token::Certificate(answer)) => Ok(self.first_certificate_answer(session, answer)),
            (State::NewUserCertificateLater, Token::Certificate(answer)) => {
                self.second_certificate_answer(session, answer).await
            }
            (State::ConfirmData, Token::Confirm(answer)) => self.confirm(session, answer).await,
            (State::EditFieldSelect, Token::EditField(field)) => Ok(self.select_edit_field(session, field)),
            (State::MoreEdits, Token::MoreEdits(answer)) => self.more_edits(session, answer).await,
            (State::Idle, _) => Ok(Transition::stay(session, vec![Reply::UseMenu])),
            (state, _) => match reprompt(session, state) {
                Some(prompt) => Ok(Transition::stay(session, vec![prompt])),
                None => Ok(Transition::stay(session, vec![Reply::UseButtons])),
            },
        }
    }
}

/// The question a text-collecting state is waiting on
fn reprompt(session: &Session, state: State) -> Option<Reply> {
    use State::*;
    let prompt = match state {
        ContactMessage => Prompt::ContactMessage,
        NewUserFirstName => Prompt::FirstName,
        NewUserLastName => Prompt::LastName,
        NewUserPhone => Prompt::Phone,
        NewUserEmail => Prompt::Email,
        NewUserBirthDate => Prompt::BirthDate,
        NewUserChannel => Prompt::Channel,
        NewUserCountry => Prompt::Country,
        NewUserCity => Prompt::City,
        NewUserSchool => Prompt::School,
        NewUserCertificateName | NewUserLateCertificateName => Prompt::CertificateName,
        NewUserCompany => Prompt::Company,
        NewUserPosition => Prompt::Position,
        NewUserImportantInfo => Prompt::ImportantInfo,
        EditValue => Prompt::EditValue(session.edit_field?),
        VoterSlotDate => Prompt::SlotDate,
        VoterSlotStart => Prompt::SlotStart,
        VoterSlotEnd => Prompt::SlotEnd,
        Idle | SelectCompetition | SelectRole | NewUserCertificateNow | NewUserCertificateLater | ConfirmData
        | EditFieldSelect | MoreEdits => return None,
    };
    Some(Reply::ask(prompt))
}
