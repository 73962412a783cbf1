//! In-process implementation of every store trait
//!
//! Mirrors the constraints the PostgreSQL schema enforces (unique chat ids,
//! one request per user/competition/role, idempotent membership, pending-only
//! outbox updates) so conversation and dispatcher behaviour can be exercised
//! without a database.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::database::store::*;
use crate::models::*;
use crate::utils::errors::{RegistrationDeskError, Result};
use crate::utils::helpers::truncate_chars;

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    users: Vec<User>,
    change_log: Vec<ProfileChangeLog>,
    competitions: Vec<Competition>,
    members: BTreeSet<(i64, i64, Role)>,
    requests: Vec<RegistrationRequest>,
    slots: Vec<VoterTimeSlot>,
    outbox: Vec<OutboxItem>,
    contacts: Vec<ContactMessage>,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn user_mut(&mut self, user_id: i64) -> Result<&mut User> {
        self.users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(RegistrationDeskError::UserNotFound { user_id })
    }

    fn apply_membership(&mut self, request: &RegistrationRequest, change: MembershipChange) {
        let key = (request.competition_id, request.user_id, request.role);
        match change {
            MembershipChange::Add => {
                self.members.insert(key);
            }
            MembershipChange::Remove => {
                self.members.remove(&key);
            }
            MembershipChange::Unchanged => {}
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// All store traits backed by this instance
    pub fn stores(self: &Arc<Self>) -> Stores {
        Stores {
            profiles: self.clone(),
            competitions: self.clone(),
            registrations: self.clone(),
            slots: self.clone(),
            outbox: self.clone(),
            contacts: self.clone(),
        }
    }

    /// Make every subsequent call fail as if the database were down
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RegistrationDeskError::ServiceUnavailable("memory store offline".to_string()));
        }
        Ok(())
    }

    pub async fn users(&self) -> Vec<User> {
        self.inner.read().await.users.clone()
    }

    pub async fn change_log(&self) -> Vec<ProfileChangeLog> {
        self.inner.read().await.change_log.clone()
    }

    pub async fn requests(&self) -> Vec<RegistrationRequest> {
        self.inner.read().await.requests.clone()
    }

    pub async fn all_slots(&self) -> Vec<VoterTimeSlot> {
        self.inner.read().await.slots.clone()
    }

    pub async fn outbox_items(&self) -> Vec<OutboxItem> {
        self.inner.read().await.outbox.clone()
    }

    pub async fn contact_messages(&self) -> Vec<ContactMessage> {
        self.inner.read().await.contacts.clone()
    }

    /// Overwrite the attempt counter of a stored outbox row
    pub async fn set_attempts(&self, item_id: i64, attempts: i32) {
        let mut inner = self.inner.write().await;
        if let Some(item) = inner.outbox.iter_mut().find(|i| i.id == item_id) {
            item.attempts = attempts;
        }
    }
}

fn blank_user(id: i64, chat_id: i64) -> User {
    let now = Utc::now();
    User {
        id,
        chat_id,
        telegram_id: None,
        username: None,
        first_name: None,
        last_name: None,
        email: None,
        phone: None,
        role: None,
        classic_rating: None,
        quick_rating: None,
        team_rating: None,
        about: None,
        birth_date: None,
        channel_name: None,
        certificate_name: None,
        country: None,
        city: None,
        school: None,
        company: None,
        position: None,
        important_info: None,
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get_or_create_by_chat(&self, identity: &TelegramIdentity) -> Result<User> {
        self.check()?;
        let mut inner = self.inner.write().await;

        if let Some(user) = inner.users.iter_mut().find(|u| u.chat_id == identity.chat_id) {
            if identity.telegram_id.is_some() {
                user.telegram_id = identity.telegram_id;
            }
            if identity.username.is_some() {
                user.username = identity.username.clone();
            }
            user.updated_at = Utc::now();
            return Ok(user.clone());
        }

        let id = inner.next_id();
        let mut user = blank_user(id, identity.chat_id);
        user.telegram_id = identity.telegram_id;
        user.username = identity.username.clone();
        user.first_name = identity.first_name.clone();
        user.last_name = identity.last_name.clone();
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>> {
        self.check()?;
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn find_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>> {
        self.check()?;
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.telegram_id == Some(telegram_id)).cloned())
    }

    async fn upsert_profile(&self, request: UpsertProfileRequest) -> Result<User> {
        self.check()?;
        let mut inner = self.inner.write().await;

        let index = match inner.users.iter().position(|u| u.chat_id == request.chat_id) {
            Some(index) => index,
            None => {
                let id = inner.next_id();
                inner.users.push(blank_user(id, request.chat_id));
                inner.users.len() - 1
            }
        };

        let user = &mut inner.users[index];
        let draft = request.draft;
        if request.telegram_id.is_some() {
            user.telegram_id = request.telegram_id;
        }
        if request.username.is_some() {
            user.username = request.username;
        }
        if request.role.is_some() {
            user.role = request.role;
        }
        user.first_name = draft.first_name;
        user.last_name = draft.last_name;
        user.phone = draft.phone;
        user.email = draft.email;
        user.birth_date = draft.birth_date;
        user.channel_name = draft.channel_name;
        user.country = draft.country;
        user.city = draft.city;
        user.school = draft.school;
        user.company = draft.company;
        user.position = draft.position;
        user.certificate_name = draft.certificate_name;
        user.important_info = draft.important_info;
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn update_column(&self, user_id: i64, column: ProfileColumn, value: Option<String>) -> Result<User> {
        self.check()?;
        let mut inner = self.inner.write().await;
        let user = inner.user_mut(user_id)?;
        user.set_column(column, value);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn log_change(&self, change: NewProfileChange) -> Result<()> {
        self.check()?;
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        inner.change_log.push(ProfileChangeLog {
            id,
            user_id: change.user_id,
            field_name: change.field_name,
            old_value: change.old_value,
            new_value: change.new_value,
            changed_at: Utc::now(),
        });
        Ok(())
    }

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>> {
        self.check()?;
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .filter(|u| role.is_none() || u.role == role)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CompetitionStore for MemoryStore {
    async fn create_competition(&self, request: CreateCompetitionRequest) -> Result<Competition> {
        self.check()?;
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let open = |role: Role| request.open_roles.contains(&role);
        let competition = Competition {
            id,
            name: request.name.clone(),
            description: request.description.clone(),
            entry_open_player: open(Role::Player),
            entry_open_voter: open(Role::Voter),
            entry_open_viewer: open(Role::Viewer),
            entry_open_adviser: open(Role::Adviser),
            created_at: Utc::now(),
        };
        inner.competitions.push(competition.clone());
        Ok(competition)
    }

    async fn list_open_competitions(&self) -> Result<Vec<Competition>> {
        self.check()?;
        let inner = self.inner.read().await;
        Ok(inner
            .competitions
            .iter()
            .filter(|c| c.accepts_registrations())
            .cloned()
            .collect())
    }

    async fn find_competition(&self, competition_id: i64) -> Result<Option<Competition>> {
        self.check()?;
        let inner = self.inner.read().await;
        Ok(inner.competitions.iter().find(|c| c.id == competition_id).cloned())
    }

    async fn add_member(&self, competition_id: i64, user_id: i64, role: Role) -> Result<bool> {
        self.check()?;
        let mut inner = self.inner.write().await;
        Ok(inner.members.insert((competition_id, user_id, role)))
    }

    async fn remove_member(&self, competition_id: i64, user_id: i64, role: Role) -> Result<bool> {
        self.check()?;
        let mut inner = self.inner.write().await;
        Ok(inner.members.remove(&(competition_id, user_id, role)))
    }

    async fn members(&self, competition_id: i64, role: Role) -> Result<Vec<i64>> {
        self.check()?;
        let inner = self.inner.read().await;
        Ok(inner
            .members
            .iter()
            .filter(|(c, _, r)| *c == competition_id && *r == role)
            .map(|(_, user_id, _)| *user_id)
            .collect())
    }
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    async fn get_or_create_request(&self, request: NewRegistrationRequest) -> Result<(RegistrationRequest, bool)> {
        self.check()?;
        let mut inner = self.inner.write().await;

        if let Some(existing) = inner.requests.iter().find(|r| {
            r.user_id == request.user_id && r.competition_id == request.competition_id && r.role == request.role
        }) {
            return Ok((existing.clone(), false));
        }

        let id = inner.next_id();
        let created = RegistrationRequest {
            id,
            user_id: request.user_id,
            competition_id: request.competition_id,
            role: request.role,
            status: RequestStatus::Pending,
            user_first_name: request.user_first_name,
            user_last_name: request.user_last_name,
            user_email: request.user_email,
            user_phone: request.user_phone,
            created_at: Utc::now(),
            reviewed_at: None,
            reviewed_by: None,
            rejection_reason: None,
        };
        inner.requests.push(created.clone());
        Ok((created, true))
    }

    async fn find_request(&self, request_id: i64) -> Result<Option<RegistrationRequest>> {
        self.check()?;
        let inner = self.inner.read().await;
        Ok(inner.requests.iter().find(|r| r.id == request_id).cloned())
    }

    async fn list_requests(&self, status: Option<RequestStatus>) -> Result<Vec<RegistrationRequest>> {
        self.check()?;
        let inner = self.inner.read().await;
        let mut requests: Vec<_> = inner
            .requests
            .iter()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(requests)
    }

    async fn approve_request(&self, request_id: i64, reviewer: Option<i64>) -> Result<RegistrationRequest> {
        self.check()?;
        let mut inner = self.inner.write().await;
        let index = inner
            .requests
            .iter()
            .position(|r| r.id == request_id)
            .ok_or(RegistrationDeskError::RegistrationRequestNotFound { request_id })?;

        let mut request = inner.requests[index].clone();
        let change = request.approve(reviewer, Utc::now())?;
        inner.apply_membership(&request, change);
        inner.requests[index] = request.clone();
        Ok(request)
    }

    async fn reject_request(
        &self,
        request_id: i64,
        reviewer: Option<i64>,
        reason: Option<String>,
    ) -> Result<RegistrationRequest> {
        self.check()?;
        let mut inner = self.inner.write().await;
        let index = inner
            .requests
            .iter()
            .position(|r| r.id == request_id)
            .ok_or(RegistrationDeskError::RegistrationRequestNotFound { request_id })?;

        let mut request = inner.requests[index].clone();
        let change = request.reject(reviewer, reason, Utc::now())?;
        inner.apply_membership(&request, change);
        inner.requests[index] = request.clone();
        Ok(request)
    }
}

#[async_trait]
impl SlotStore for MemoryStore {
    async fn create_slot(&self, slot: NewVoterTimeSlot) -> Result<VoterTimeSlot> {
        self.check()?;
        if slot.end_time <= slot.start_time {
            return Err(RegistrationDeskError::InvalidInput(
                "slot end time must be later than start time".to_string(),
            ));
        }

        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.slots.iter().find(|s| {
            s.voter_id == slot.voter_id
                && s.competition_id == slot.competition_id
                && s.slot_date == slot.slot_date
                && s.start_time == slot.start_time
                && s.end_time == slot.end_time
        }) {
            return Ok(existing.clone());
        }

        let id = inner.next_id();
        let created = VoterTimeSlot {
            id,
            competition_id: slot.competition_id,
            voter_id: slot.voter_id,
            slot_date: slot.slot_date,
            start_time: slot.start_time,
            end_time: slot.end_time,
            created_at: Utc::now(),
        };
        inner.slots.push(created.clone());
        Ok(created)
    }

    async fn slots_for_voter(&self, competition_id: i64, voter_id: i64) -> Result<Vec<VoterTimeSlot>> {
        self.check()?;
        let inner = self.inner.read().await;
        Ok(inner
            .slots
            .iter()
            .filter(|s| s.competition_id == competition_id && s.voter_id == voter_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl OutboxStore for MemoryStore {
    async fn enqueue(&self, item: NewOutboxItem) -> Result<OutboxItem> {
        self.check()?;
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let created = OutboxItem {
            id,
            user_id: item.user_id,
            chat_id: item.chat_id,
            message: item.message,
            status: OutboxStatus::Pending,
            attempts: 0,
            last_error: None,
            created_at: Utc::now(),
            sent_at: None,
        };
        inner.outbox.push(created.clone());
        Ok(created)
    }

    async fn fetch_pending(&self, limit: u32) -> Result<Vec<OutboxItem>> {
        self.check()?;
        let inner = self.inner.read().await;
        let mut pending: Vec<_> = inner
            .outbox
            .iter()
            .filter(|i| i.status == OutboxStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        pending.truncate(limit as usize);
        Ok(pending)
    }

    async fn mark_sent(&self, item_id: i64) -> Result<bool> {
        self.check()?;
        let mut inner = self.inner.write().await;
        match inner
            .outbox
            .iter_mut()
            .find(|i| i.id == item_id && i.status == OutboxStatus::Pending)
        {
            Some(item) => {
                item.status = OutboxStatus::Sent;
                item.sent_at = Some(Utc::now());
                item.last_error = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_failed(&self, item_id: i64, failure: OutboxFailure) -> Result<bool> {
        self.check()?;
        let mut inner = self.inner.write().await;
        match inner
            .outbox
            .iter_mut()
            .find(|i| i.id == item_id && i.status == OutboxStatus::Pending)
        {
            Some(item) => {
                item.status = failure.status;
                item.attempts = failure.attempts;
                item.last_error = Some(truncate_chars(&failure.last_error, MAX_ERROR_CHARS));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_item(&self, item_id: i64) -> Result<Option<OutboxItem>> {
        self.check()?;
        let inner = self.inner.read().await;
        Ok(inner.outbox.iter().find(|i| i.id == item_id).cloned())
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn record_contact_message(&self, message: NewContactMessage) -> Result<ContactMessage> {
        self.check()?;
        let mut inner = self.inner.write().await;
        let id = inner.next_id();
        let record = ContactMessage {
            id,
            chat_id: message.chat_id,
            username: message.username,
            body: message.body,
            delivered: message.delivered,
            created_at: Utc::now(),
        };
        inner.contacts.push(record.clone());
        Ok(record)
    }
}
