//! Competition and role selection, the confirmation screen, and submission

use tracing::info;

use super::{ConversationMachine, Transition};
use crate::models::{Competition, NewRegistrationRequest, Role, User};
use crate::state::replies::{CompetitionChoice, ConfirmationCard, Prompt, Reply};
use crate::state::session::Session;
use crate::state::transitions::State;
use crate::utils::errors::{RegistrationDeskError, Result};
use crate::utils::logging::log_user_action;

fn registration_closed() -> Transition {
    Transition::idle(vec![Reply::RegistrationClosed])
}

impl ConversationMachine {
    pub(super) async fn begin_registration(&self, session: &mut Session) -> Result<Transition> {
        let competitions = self.stores.competitions.list_open_competitions().await?;

        match competitions.as_slice() {
            [] => Ok(registration_closed()),
            [only] => Ok(enter_competition(session, only)),
            many => Ok(Transition::to(
                State::SelectCompetition,
                vec![Reply::ChooseCompetition {
                    competitions: many.iter().map(CompetitionChoice::from).collect(),
                }],
            )),
        }
    }

    pub(super) async fn select_competition(&self, session: &mut Session, competition_id: i64) -> Result<Transition> {
        match self.stores.competitions.find_competition(competition_id).await? {
            Some(competition) => Ok(enter_competition(session, &competition)),
            None => Ok(registration_closed()),
        }
    }

    pub(super) async fn select_role(&self, session: &mut Session, role: Role) -> Result<Transition> {
        let competition = match session.competition_id {
            Some(id) => self.stores.competitions.find_competition(id).await?,
            None => None,
        };
        let Some(competition) = competition else {
            return Ok(registration_closed());
        };

        let roles = competition.open_roles();
        if roles.is_empty() {
            return Ok(registration_closed());
        }
        if !roles.contains(&role) {
            // The role closed after the chooser was shown
            return Ok(Transition::stay(
                session,
                vec![Reply::ChooseRole { competition_name: competition.name, roles }],
            ));
        }

        session.role = Some(role);
        log_user_action(session.chat_id, "role_selected", Some(role.as_str()));

        match self.existing_profile(session).await? {
            Some(user) => Ok(self.show_confirmation(session, &user)),
            None => Ok(Transition::to(State::NewUserFirstName, vec![Reply::ask(Prompt::FirstName)])),
        }
    }

    /// Profile behind this chat's Telegram account, if it was ever filled in
    pub(super) async fn existing_profile(&self, session: &Session) -> Result<Option<User>> {
        let Some(telegram_id) = session.telegram_user_id else {
            return Ok(None);
        };
        let user = self.stores.profiles.find_by_telegram_id(telegram_id).await?;
        Ok(user.filter(User::has_contact_details))
    }

    pub(super) fn show_confirmation(&self, session: &mut Session, user: &User) -> Transition {
        session.profile_id = Some(user.id);
        let competition_name = session.competition_name.clone().unwrap_or_default();
        let role = session.role.unwrap_or(Role::Viewer);
        Transition::to(
            State::ConfirmData,
            vec![Reply::Confirmation { card: ConfirmationCard::new(user, &competition_name, role) }],
        )
    }

    pub(super) async fn confirm(&self, session: &mut Session, accepted: bool) -> Result<Transition> {
        if !accepted {
            return Ok(Transition::to(State::EditFieldSelect, vec![edit_field_chooser()]));
        }

        let (Some(competition_id), Some(role), Some(user_id)) =
            (session.competition_id, session.role, session.profile_id)
        else {
            return Err(RegistrationDeskError::InvalidInput(
                "confirmation without competition, role or profile".to_string(),
            ));
        };

        let user = self
            .stores
            .profiles
            .find_by_id(user_id)
            .await?
            .ok_or(RegistrationDeskError::UserNotFound { user_id })?;

        let (request, created) = self
            .stores
            .registrations
            .get_or_create_request(NewRegistrationRequest::snapshot(&user, competition_id, role))
            .await?;

        info!(
            chat_id = session.chat_id,
            request_id = request.id,
            competition_id,
            role = %role,
            created,
            "Registration request submitted"
        );

        if role == Role::Voter {
            return Ok(Transition::to(State::VoterSlotDate, vec![Reply::ask(Prompt::SlotDate)]));
        }

        let competition_name = session.competition_name.clone().unwrap_or_default();
        Ok(Transition::idle(vec![Reply::RegistrationSubmitted {
            competition_name,
            role,
            already_submitted: !created,
        }]))
    }
}

/// Remember the competition and offer its open roles; no open roles means closed
fn enter_competition(session: &mut Session, competition: &Competition) -> Transition {
    let roles = competition.open_roles();
    if roles.is_empty() {
        return registration_closed();
    }

    session.competition_id = Some(competition.id);
    session.competition_name = Some(competition.name.clone());

    Transition::to(
        State::SelectRole,
        vec![Reply::ChooseRole { competition_name: competition.name.clone(), roles }],
    )
}

pub(super) fn edit_field_chooser() -> Reply {
    Reply::ChooseEditField { fields: crate::models::EditableField::ALL.to_vec() }
}
