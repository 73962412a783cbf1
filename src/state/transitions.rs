//! Conversation states and the transition table
//!
//! Every edge the conversation may take is listed in [`State::allowed_next`].
//! Two edges are implicit for every state: a self-loop (re-prompt after
//! rejected input) and the move back to [`State::Idle`] (cancel, `/start`,
//! or completion).

use serde::{Deserialize, Serialize};

use crate::utils::errors::{RegistrationDeskError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    #[default]
    Idle,
    ContactMessage,
    SelectCompetition,
    SelectRole,
    NewUserFirstName,
    NewUserLastName,
    NewUserPhone,
    NewUserEmail,
    NewUserBirthDate,
    NewUserChannel,
    NewUserCountry,
    NewUserCity,
    NewUserSchool,
    /// First certificate question, asked before company
    NewUserCertificateNow,
    NewUserCertificateName,
    NewUserCompany,
    NewUserPosition,
    /// Second certificate question, asked after position
    NewUserCertificateLater,
    NewUserLateCertificateName,
    NewUserImportantInfo,
    ConfirmData,
    EditFieldSelect,
    EditValue,
    MoreEdits,
    VoterSlotDate,
    VoterSlotStart,
    VoterSlotEnd,
}

impl State {
    pub const ALL: [State; 27] = [
        State::Idle,
        State::ContactMessage,
        State::SelectCompetition,
        State::SelectRole,
        State::NewUserFirstName,
        State::NewUserLastName,
        State::NewUserPhone,
        State::NewUserEmail,
        State::NewUserBirthDate,
        State::NewUserChannel,
        State::NewUserCountry,
        State::NewUserCity,
        State::NewUserSchool,
        State::NewUserCertificateNow,
        State::NewUserCertificateName,
        State::NewUserCompany,
        State::NewUserPosition,
        State::NewUserCertificateLater,
        State::NewUserLateCertificateName,
        State::NewUserImportantInfo,
        State::ConfirmData,
        State::EditFieldSelect,
        State::EditValue,
        State::MoreEdits,
        State::VoterSlotDate,
        State::VoterSlotStart,
        State::VoterSlotEnd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            State::Idle => "idle",
            State::ContactMessage => "contact_message",
            State::SelectCompetition => "select_competition",
            State::SelectRole => "select_role",
            State::NewUserFirstName => "new_user_first_name",
            State::NewUserLastName => "new_user_last_name",
            State::NewUserPhone => "new_user_phone",
            State::NewUserEmail => "new_user_email",
            State::NewUserBirthDate => "new_user_birth_date",
            State::NewUserChannel => "new_user_channel",
            State::NewUserCountry => "new_user_country",
            State::NewUserCity => "new_user_city",
            State::NewUserSchool => "new_user_school",
            State::NewUserCertificateNow => "new_user_certificate_now",
            State::NewUserCertificateName => "new_user_certificate_name",
            State::NewUserCompany => "new_user_company",
            State::NewUserPosition => "new_user_position",
            State::NewUserCertificateLater => "new_user_certificate_later",
            State::NewUserLateCertificateName => "new_user_late_certificate_name",
            State::NewUserImportantInfo => "new_user_important_info",
            State::ConfirmData => "confirm_data",
            State::EditFieldSelect => "edit_field_select",
            State::EditValue => "edit_value",
            State::MoreEdits => "more_edits",
            State::VoterSlotDate => "voter_slot_date",
            State::VoterSlotStart => "voter_slot_start",
            State::VoterSlotEnd => "voter_slot_end",
        }
    }

    /// Explicit outgoing edges, excluding the implicit self-loop and `Idle`
    pub fn allowed_next(&self) -> &'static [State] {
        use State::*;
        match self {
            Idle => &[ContactMessage, SelectCompetition, SelectRole],
            ContactMessage => &[],
            SelectCompetition => &[SelectRole],
            SelectRole => &[ConfirmData, NewUserFirstName],
            NewUserFirstName => &[NewUserLastName],
            NewUserLastName => &[NewUserPhone],
            NewUserPhone => &[NewUserEmail],
            NewUserEmail => &[NewUserBirthDate],
            NewUserBirthDate => &[NewUserChannel],
            NewUserChannel => &[NewUserCountry],
            NewUserCountry => &[NewUserCity],
            NewUserCity => &[NewUserSchool],
            NewUserSchool => &[NewUserCertificateNow],
            NewUserCertificateNow => &[NewUserCertificateName, NewUserCompany],
            NewUserCertificateName => &[NewUserCompany],
            NewUserCompany => &[NewUserPosition],
            NewUserPosition => &[NewUserCertificateLater],
            NewUserCertificateLater => &[NewUserImportantInfo, NewUserLateCertificateName, ConfirmData],
            NewUserLateCertificateName => &[NewUserImportantInfo],
            NewUserImportantInfo => &[ConfirmData],
            ConfirmData => &[EditFieldSelect, VoterSlotDate],
            EditFieldSelect => &[EditValue],
            EditValue => &[MoreEdits],
            MoreEdits => &[EditFieldSelect, ConfirmData],
            VoterSlotDate => &[VoterSlotStart],
            VoterSlotStart => &[VoterSlotEnd],
            VoterSlotEnd => &[],
        }
    }

    pub fn can_move_to(&self, next: State) -> bool {
        next == *self || next == State::Idle || self.allowed_next().contains(&next)
    }

    /// Fails with [`RegistrationDeskError::InvalidStateTransition`] for edges not in the table
    pub fn check_move(&self, next: State) -> Result<()> {
        if self.can_move_to(next) {
            Ok(())
        } else {
            Err(RegistrationDeskError::InvalidStateTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }

    /// States that consume free text; the rest wait for a button
    pub fn expects_text(&self) -> bool {
        use State::*;
        !matches!(
            self,
            Idle | SelectCompetition
                | SelectRole
                | NewUserCertificateNow
                | NewUserCertificateLater
                | ConfirmData
                | EditFieldSelect
                | MoreEdits
        )
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the new-user chain goes once both certificate answers are known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateOutcome {
    /// Certificate name already collected; ask how to present the user
    AskImportantInfo,
    /// Certificate name still missing; ask for it, then how to present the user
    AskLateCertificateName,
    Finalize,
}

/// Resolve the (first answer, second answer) pair; nothing else may influence it
pub fn resolve_certificate(first: bool, second: bool) -> CertificateOutcome {
    match (first, second) {
        (true, true) => CertificateOutcome::AskImportantInfo,
        (true, false) => CertificateOutcome::Finalize,
        (false, true) => CertificateOutcome::AskLateCertificateName,
        (false, false) => CertificateOutcome::Finalize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn every_state_can_return_to_idle_and_loop() {
        for state in State::ALL {
            assert!(state.can_move_to(State::Idle), "{state}");
            assert!(state.can_move_to(state), "{state}");
        }
    }

    #[test]
    fn every_state_is_reachable_from_idle() {
        let mut seen = vec![State::Idle];
        let mut frontier = vec![State::Idle];
        while let Some(state) = frontier.pop() {
            for next in state.allowed_next() {
                if !seen.contains(next) {
                    seen.push(*next);
                    frontier.push(*next);
                }
            }
        }
        for state in State::ALL {
            assert!(seen.contains(&state), "{state} unreachable");
        }
    }

    #[test]
    fn skipping_ahead_is_refused() {
        assert_matches!(
            State::NewUserFirstName.check_move(State::ConfirmData),
            Err(RegistrationDeskError::InvalidStateTransition { .. })
        );
        assert!(State::VoterSlotEnd.check_move(State::VoterSlotStart).is_err());
        assert!(State::ConfirmData.check_move(State::VoterSlotDate).is_ok());
    }

    #[test]
    fn certificate_table() {
        assert_eq!(resolve_certificate(true, true), CertificateOutcome::AskImportantInfo);
        assert_eq!(resolve_certificate(true, false), CertificateOutcome::Finalize);
        assert_eq!(resolve_certificate(false, true), CertificateOutcome::AskLateCertificateName);
        assert_eq!(resolve_certificate(false, false), CertificateOutcome::Finalize);
    }

    #[test]
    fn state_names_round_trip_through_serde() {
        for state in State::ALL {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{}\"", state.as_str()));
        }
    }
}
