//! New-user profile chain
//!
//! name → surname → phone → email → birth date → channel → country → city →
//! school → certificate question → [certificate name] → company → position →
//! certificate question again → resolved by [`resolve_certificate`].

use super::{ConversationMachine, Transition};
use crate::models::UpsertProfileRequest;
use crate::state::replies::{Prompt, Reply};
use crate::state::session::Session;
use crate::state::transitions::{resolve_certificate, CertificateOutcome, State};
use crate::utils::errors::Result;
use crate::utils::logging::log_user_action;
use crate::validation::{
    parse_email, parse_optional, parse_optional_birth_date, parse_phone, parse_required, ValidationError,
};

fn ask(next: State, prompt: Prompt) -> Transition {
    Transition::to(next, vec![Reply::ask(prompt)])
}

fn rejected(session: &Session, error: ValidationError, prompt: Prompt) -> Transition {
    Transition::stay(session, vec![Reply::invalid(error), Reply::ask(prompt)])
}

impl ConversationMachine {
    pub(super) async fn new_user_text(&self, session: &mut Session, text: &str) -> Result<Transition> {
        let transition = match session.state {
            State::NewUserFirstName => match parse_required(text) {
                Ok(value) => {
                    session.draft.first_name = Some(value);
                    ask(State::NewUserLastName, Prompt::LastName)
                }
                Err(e) => rejected(session, e, Prompt::FirstName),
            },
            State::NewUserLastName => match parse_required(text) {
                Ok(value) => {
                    session.draft.last_name = Some(value);
                    ask(State::NewUserPhone, Prompt::Phone)
                }
                Err(e) => rejected(session, e, Prompt::LastName),
            },
            State::NewUserPhone => match parse_phone(text) {
                Ok(value) => {
                    session.draft.phone = Some(value);
                    ask(State::NewUserEmail, Prompt::Email)
                }
                Err(e) => rejected(session, e, Prompt::Phone),
            },
            State::NewUserEmail => match parse_email(text) {
                Ok(value) => {
                    session.draft.email = Some(value);
                    ask(State::NewUserBirthDate, Prompt::BirthDate)
                }
                Err(e) => rejected(session, e, Prompt::Email),
            },
            State::NewUserBirthDate => match parse_optional_birth_date(text, (self.today)()) {
                Ok(value) => {
                    session.draft.birth_date = value;
                    ask(State::NewUserChannel, Prompt::Channel)
                }
                Err(e) => rejected(session, e, Prompt::BirthDate),
            },
            State::NewUserChannel => match parse_optional(text) {
                Ok(value) => {
                    session.draft.channel_name = value;
                    ask(State::NewUserCountry, Prompt::Country)
                }
                Err(e) => rejected(session, e, Prompt::Channel),
            },
            State::NewUserCountry => match parse_required(text) {
                Ok(value) => {
                    session.draft.country = Some(value);
                    ask(State::NewUserCity, Prompt::City)
                }
                Err(e) => rejected(session, e, Prompt::Country),
            },
            State::NewUserCity => match parse_required(text) {
                Ok(value) => {
                    session.draft.city = Some(value);
                    ask(State::NewUserSchool, Prompt::School)
                }
                Err(e) => rejected(session, e, Prompt::City),
            },
            State::NewUserSchool => match parse_required(text) {
                Ok(value) => {
                    session.draft.school = Some(value);
                    Transition::to(State::NewUserCertificateNow, vec![Reply::AskCertificate { later: false }])
                }
                Err(e) => rejected(session, e, Prompt::School),
            },
            State::NewUserCertificateName => match parse_required(text) {
                Ok(value) => {
                    session.draft.certificate_name = Some(value);
                    ask(State::NewUserCompany, Prompt::Company)
                }
                Err(e) => rejected(session, e, Prompt::CertificateName),
            },
            State::NewUserCompany => match parse_required(text) {
                Ok(value) => {
                    session.draft.company = Some(value);
                    ask(State::NewUserPosition, Prompt::Position)
                }
                Err(e) => rejected(session, e, Prompt::Company),
            },
            State::NewUserPosition => match parse_required(text) {
                Ok(value) => {
                    session.draft.position = Some(value);
                    Transition::to(State::NewUserCertificateLater, vec![Reply::AskCertificate { later: true }])
                }
                Err(e) => rejected(session, e, Prompt::Position),
            },
            State::NewUserLateCertificateName => match parse_required(text) {
                Ok(value) => {
                    session.draft.certificate_name = Some(value);
                    ask(State::NewUserImportantInfo, Prompt::ImportantInfo)
                }
                Err(e) => rejected(session, e, Prompt::CertificateName),
            },
            State::NewUserImportantInfo => match parse_required(text) {
                Ok(value) => {
                    session.draft.important_info = Some(value);
                    return self.finalize_new_user(session).await;
                }
                Err(e) => rejected(session, e, Prompt::ImportantInfo),
            },
            _ => Transition::stay(session, vec![Reply::UseButtons]),
        };

        Ok(transition)
    }

    pub(super) fn first_certificate_answer(&self, session: &mut Session, answer: bool) -> Transition {
        session.first_cert_answer = Some(answer);
        if answer {
            ask(State::NewUserCertificateName, Prompt::CertificateName)
        } else {
            ask(State::NewUserCompany, Prompt::Company)
        }
    }

    pub(super) async fn second_certificate_answer(&self, session: &mut Session, answer: bool) -> Result<Transition> {
        session.second_cert_answer = Some(answer);
        let first = session.first_cert_answer.unwrap_or(false);

        match resolve_certificate(first, answer) {
            CertificateOutcome::AskImportantInfo => Ok(ask(State::NewUserImportantInfo, Prompt::ImportantInfo)),
            CertificateOutcome::AskLateCertificateName => {
                Ok(ask(State::NewUserLateCertificateName, Prompt::CertificateName))
            }
            CertificateOutcome::Finalize => self.finalize_new_user(session).await,
        }
    }

    /// Persist the draft and show the shared confirmation screen; no request yet
    async fn finalize_new_user(&self, session: &mut Session) -> Result<Transition> {
        let user = self
            .stores
            .profiles
            .upsert_profile(UpsertProfileRequest {
                chat_id: session.chat_id,
                telegram_id: session.telegram_user_id,
                username: session.username.clone(),
                role: session.role,
                draft: session.draft.clone(),
            })
            .await?;

        log_user_action(session.chat_id, "profile_completed", None);
        Ok(self.show_confirmation(session, &user))
    }
}
