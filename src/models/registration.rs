//! Registration request model and review rules

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{text_column, Role, UnknownVariant, User};
use crate::utils::errors::ReviewError;

pub const DEFAULT_REJECTION_REASON: &str = "Причина не указана";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for RequestStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            other => Err(UnknownVariant { kind: "request status", value: other.to_string() }),
        }
    }
}

text_column!(RequestStatus);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RegistrationRequest {
    pub id: i64,
    pub user_id: i64,
    pub competition_id: i64,
    pub role: Role,
    pub status: RequestStatus,
    pub user_first_name: String,
    pub user_last_name: String,
    pub user_email: String,
    pub user_phone: String,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<i64>,
    pub rejection_reason: Option<String>,
}

/// Registration submitted from the confirmation screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRegistrationRequest {
    pub user_id: i64,
    pub competition_id: i64,
    pub role: Role,
    pub user_first_name: String,
    pub user_last_name: String,
    pub user_email: String,
    pub user_phone: String,
}

impl NewRegistrationRequest {
    /// Snapshot the profile's contact data at submission time
    pub fn snapshot(user: &User, competition_id: i64, role: Role) -> Self {
        Self {
            user_id: user.id,
            competition_id,
            role,
            user_first_name: user.first_name.clone().unwrap_or_default(),
            user_last_name: user.last_name.clone().unwrap_or_default(),
            user_email: user.email.clone().unwrap_or_default(),
            user_phone: user.phone.clone().unwrap_or_default(),
        }
    }
}

/// Effect a review decision has on the competition's membership set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    Add,
    Remove,
    Unchanged,
}

impl RegistrationRequest {
    /// Move a pending request to approved; any other status is refused untouched.
    pub fn approve(&mut self, reviewer: Option<i64>, at: DateTime<Utc>) -> Result<MembershipChange, ReviewError> {
        if self.status != RequestStatus::Pending {
            return Err(ReviewError::NotPending { status: self.status.to_string() });
        }

        self.status = RequestStatus::Approved;
        self.reviewed_at = Some(at);
        self.reviewed_by = reviewer;
        Ok(MembershipChange::Add)
    }

    /// Reject a pending or approved request. Rejecting an approved one revokes membership.
    pub fn reject(
        &mut self,
        reviewer: Option<i64>,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<MembershipChange, ReviewError> {
        let change = match self.status {
            RequestStatus::Pending => MembershipChange::Unchanged,
            RequestStatus::Approved => MembershipChange::Remove,
            RequestStatus::Rejected => {
                return Err(ReviewError::NotRejectable { status: self.status.to_string() })
            }
        };

        self.status = RequestStatus::Rejected;
        self.reviewed_at = Some(at);
        self.reviewed_by = reviewer;
        self.rejection_reason = Some(
            reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string()),
        );
        Ok(change)
    }
}
