//! Field edits from the confirmation screen

use super::registration::edit_field_chooser;
use super::{ConversationMachine, Transition};
use crate::models::{EditableField, NewProfileChange, ProfileColumn, User};
use crate::state::replies::{Prompt, Reply};
use crate::state::session::Session;
use crate::state::transitions::State;
use crate::utils::errors::{RegistrationDeskError, Result};
use crate::utils::logging::log_profile_change;
use crate::validation::{parse_email, parse_phone, parse_required, ValidationError};

/// Parse an edit for `field` into the columns it writes
fn parse_edit(field: EditableField, text: &str) -> std::result::Result<Vec<(ProfileColumn, String)>, ValidationError> {
    match field {
        EditableField::Name => {
            let value = parse_required(text)?;
            match value.split_once(char::is_whitespace) {
                Some((first, last)) if !last.trim().is_empty() => Ok(vec![
                    (ProfileColumn::FirstName, first.to_string()),
                    (ProfileColumn::LastName, last.trim().to_string()),
                ]),
                _ => Ok(vec![(ProfileColumn::FirstName, value)]),
            }
        }
        EditableField::Phone => Ok(vec![(ProfileColumn::Phone, parse_phone(text)?)]),
        EditableField::Email => Ok(vec![(ProfileColumn::Email, parse_email(text)?)]),
        other => Ok(vec![(other.column(), parse_required(text)?)]),
    }
}

impl ConversationMachine {
    pub(super) fn select_edit_field(&self, session: &mut Session, field: EditableField) -> Transition {
        session.edit_field = Some(field);
        Transition::to(State::EditValue, vec![Reply::ask(Prompt::EditValue(field))])
    }

    pub(super) async fn apply_edit(&self, session: &mut Session, text: &str) -> Result<Transition> {
        let Some(field) = session.edit_field else {
            return Ok(Transition::to(State::EditFieldSelect, vec![edit_field_chooser()]));
        };

        let columns = match parse_edit(field, text) {
            Ok(columns) => columns,
            Err(e) => {
                return Ok(Transition::stay(
                    session,
                    vec![Reply::invalid(e), Reply::ask(Prompt::EditValue(field))],
                ))
            }
        };

        let user_id = session
            .profile_id
            .ok_or_else(|| RegistrationDeskError::InvalidInput("edit without a profile".to_string()))?;
        let mut user: User = self
            .stores
            .profiles
            .find_by_id(user_id)
            .await?
            .ok_or(RegistrationDeskError::UserNotFound { user_id })?;

        for (column, value) in columns {
            let old_value = user.column_value(column).map(str::to_string);
            if old_value.as_deref() == Some(value.as_str()) {
                continue;
            }

            user = self.stores.profiles.update_column(user_id, column, Some(value.clone())).await?;
            self.stores
                .profiles
                .log_change(NewProfileChange {
                    user_id,
                    field_name: column.as_str().to_string(),
                    old_value,
                    new_value: Some(value),
                })
                .await?;
            log_profile_change(user_id, column.as_str());
        }

        session.edit_field = None;
        Ok(Transition::to(
            State::MoreEdits,
            vec![Reply::FieldUpdated { field }, Reply::AskMoreEdits],
        ))
    }

    pub(super) async fn more_edits(&self, session: &mut Session, more: bool) -> Result<Transition> {
        if more {
            return Ok(Transition::to(State::EditFieldSelect, vec![edit_field_chooser()]));
        }

        let user = match self.existing_profile(session).await? {
            Some(user) => Some(user),
            None => match session.profile_id {
                Some(user_id) => self.stores.profiles.find_by_id(user_id).await?,
                None => None,
            },
        };

        match user {
            Some(user) => Ok(self.show_confirmation(session, &user)),
            None => Err(RegistrationDeskError::InvalidInput(
                "edits finished without a profile".to_string(),
            )),
        }
    }
}
