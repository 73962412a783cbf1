//! Persistence contracts used by the conversation and the background services
//!
//! Each aggregate gets its own trait so callers depend only on what they touch.
//! [`crate::database::DatabaseService`] implements them over PostgreSQL and
//! [`crate::database::MemoryStore`] keeps everything in process memory.

use std::sync::Arc;

use async_trait::async_trait;

use crate::models::*;
use crate::utils::errors::Result;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch the profile bound to a chat, creating it from the Telegram identity if absent
    async fn get_or_create_by_chat(&self, identity: &TelegramIdentity) -> Result<User>;

    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>>;

    /// `Ok(None)` means the user has never filled in a profile
    async fn find_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>>;

    async fn upsert_profile(&self, request: UpsertProfileRequest) -> Result<User>;

    async fn update_column(&self, user_id: i64, column: ProfileColumn, value: Option<String>) -> Result<User>;

    async fn log_change(&self, change: NewProfileChange) -> Result<()>;

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>>;
}

#[async_trait]
pub trait CompetitionStore: Send + Sync {
    async fn create_competition(&self, request: CreateCompetitionRequest) -> Result<Competition>;

    /// Competitions with at least one role open for registration, oldest first
    async fn list_open_competitions(&self) -> Result<Vec<Competition>>;

    async fn find_competition(&self, competition_id: i64) -> Result<Option<Competition>>;

    async fn open_roles(&self, competition_id: i64) -> Result<Vec<Role>> {
        Ok(self
            .find_competition(competition_id)
            .await?
            .map(|competition| competition.open_roles())
            .unwrap_or_default())
    }

    /// Idempotent; returns `false` when the user already held the role
    async fn add_member(&self, competition_id: i64, user_id: i64, role: Role) -> Result<bool>;

    async fn remove_member(&self, competition_id: i64, user_id: i64, role: Role) -> Result<bool>;

    async fn members(&self, competition_id: i64, role: Role) -> Result<Vec<i64>>;
}

#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Returns the request and whether it was created by this call
    async fn get_or_create_request(&self, request: NewRegistrationRequest) -> Result<(RegistrationRequest, bool)>;

    async fn find_request(&self, request_id: i64) -> Result<Option<RegistrationRequest>>;

    async fn list_requests(&self, status: Option<RequestStatus>) -> Result<Vec<RegistrationRequest>>;

    /// Apply [`RegistrationRequest::approve`] and its membership change atomically
    async fn approve_request(&self, request_id: i64, reviewer: Option<i64>) -> Result<RegistrationRequest>;

    /// Apply [`RegistrationRequest::reject`] and its membership change atomically
    async fn reject_request(
        &self,
        request_id: i64,
        reviewer: Option<i64>,
        reason: Option<String>,
    ) -> Result<RegistrationRequest>;
}

#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Creating an identical slot twice returns the existing row
    async fn create_slot(&self, slot: NewVoterTimeSlot) -> Result<VoterTimeSlot>;

    async fn slots_for_voter(&self, competition_id: i64, voter_id: i64) -> Result<Vec<VoterTimeSlot>>;
}

#[async_trait]
pub trait OutboxStore: Send + Sync {
    async fn enqueue(&self, item: NewOutboxItem) -> Result<OutboxItem>;

    /// Pending rows, oldest first
    async fn fetch_pending(&self, limit: u32) -> Result<Vec<OutboxItem>>;

    /// Only a pending row can change; returns `false` otherwise
    async fn mark_sent(&self, item_id: i64) -> Result<bool>;

    async fn mark_failed(&self, item_id: i64, failure: OutboxFailure) -> Result<bool>;

    async fn find_item(&self, item_id: i64) -> Result<Option<OutboxItem>>;
}

#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn record_contact_message(&self, message: NewContactMessage) -> Result<ContactMessage>;
}

/// Every store the application needs, behind trait objects
#[derive(Clone)]
pub struct Stores {
    pub profiles: Arc<dyn ProfileStore>,
    pub competitions: Arc<dyn CompetitionStore>,
    pub registrations: Arc<dyn RegistrationStore>,
    pub slots: Arc<dyn SlotStore>,
    pub outbox: Arc<dyn OutboxStore>,
    pub contacts: Arc<dyn ContactStore>,
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}
