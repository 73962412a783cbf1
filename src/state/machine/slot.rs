//! Voter time slot: date, then start, then end

use super::{ConversationMachine, Transition};
use crate::models::NewVoterTimeSlot;
use crate::state::replies::{Prompt, Reply};
use crate::state::session::Session;
use crate::state::transitions::State;
use crate::utils::errors::{RegistrationDeskError, Result};
use crate::utils::logging::log_user_action;
use crate::validation::{parse_date, parse_time, validate_slot_end};

impl ConversationMachine {
    pub(super) async fn slot_text(&self, session: &mut Session, text: &str) -> Result<Transition> {
        match session.state {
            State::VoterSlotDate => Ok(match parse_date(text) {
                Ok(date) => {
                    session.slot_date = Some(date);
                    Transition::to(State::VoterSlotStart, vec![Reply::ask(Prompt::SlotStart)])
                }
                Err(e) => Transition::stay(session, vec![Reply::invalid(e), Reply::ask(Prompt::SlotDate)]),
            }),
            State::VoterSlotStart => Ok(match parse_time(text) {
                Ok(start) => {
                    session.slot_start = Some(start);
                    Transition::to(State::VoterSlotEnd, vec![Reply::ask(Prompt::SlotEnd)])
                }
                Err(e) => Transition::stay(session, vec![Reply::invalid(e), Reply::ask(Prompt::SlotStart)]),
            }),
            State::VoterSlotEnd => self.finish_slot(session, text).await,
            _ => Ok(Transition::stay(session, vec![Reply::UseButtons])),
        }
    }

    async fn finish_slot(&self, session: &mut Session, text: &str) -> Result<Transition> {
        let (Some(competition_id), Some(voter_id), Some(slot_date), Some(start_time)) =
            (session.competition_id, session.profile_id, session.slot_date, session.slot_start)
        else {
            return Err(RegistrationDeskError::InvalidInput(
                "slot end without competition, voter, date or start".to_string(),
            ));
        };

        // Only the end is asked again; date and start stay as entered
        let end_time = match validate_slot_end(text, start_time) {
            Ok(end) => end,
            Err(e) => {
                return Ok(Transition::stay(session, vec![Reply::invalid(e), Reply::ask(Prompt::SlotEnd)]))
            }
        };
        session.slot_end = Some(end_time);

        let slot = self
            .stores
            .slots
            .create_slot(NewVoterTimeSlot { competition_id, voter_id, slot_date, start_time, end_time })
            .await?;

        log_user_action(session.chat_id, "voter_slot_saved", Some(&slot.id.to_string()));
        Ok(Transition::idle(vec![Reply::SlotSaved {
            date: slot.slot_date,
            start: slot.start_time,
            end: slot.end_time,
        }]))
    }
}
