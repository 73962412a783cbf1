//! Voter time slot repository implementation

use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::store::SlotStore;
use crate::models::{NewVoterTimeSlot, VoterTimeSlot};
use crate::utils::errors::RegistrationDeskError;

const SLOT_COLUMNS: &str = "id, competition_id, voter_id, slot_date, start_time, end_time, created_at";

#[derive(Clone, Debug)]
pub struct SlotRepository {
    pool: PgPool,
}

impl SlotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SlotStore for SlotRepository {
    async fn create_slot(&self, slot: NewVoterTimeSlot) -> Result<VoterTimeSlot, RegistrationDeskError> {
        if slot.end_time <= slot.start_time {
            return Err(RegistrationDeskError::InvalidInput(
                "slot end time must be later than start time".to_string(),
            ));
        }

        // The no-op DO UPDATE lets RETURNING yield the existing row on a duplicate
        let sql = format!(
            r#"
            INSERT INTO voter_time_slots (competition_id, voter_id, slot_date, start_time, end_time, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (voter_id, competition_id, slot_date, start_time, end_time)
            DO UPDATE SET slot_date = EXCLUDED.slot_date
            RETURNING {SLOT_COLUMNS}
            "#
        );

        let created = sqlx::query_as::<_, VoterTimeSlot>(&sql)
            .bind(slot.competition_id)
            .bind(slot.voter_id)
            .bind(slot.slot_date)
            .bind(slot.start_time)
            .bind(slot.end_time)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn slots_for_voter(
        &self,
        competition_id: i64,
        voter_id: i64,
    ) -> Result<Vec<VoterTimeSlot>, RegistrationDeskError> {
        let sql = format!(
            "SELECT {SLOT_COLUMNS} FROM voter_time_slots WHERE competition_id = $1 AND voter_id = $2 ORDER BY slot_date, start_time"
        );
        let slots = sqlx::query_as::<_, VoterTimeSlot>(&sql)
            .bind(competition_id)
            .bind(voter_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(slots)
    }
}
