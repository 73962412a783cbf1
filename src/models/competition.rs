//! Competition and role models

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{text_column, UnknownVariant};

/// Role a participant registers for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Player,
    Voter,
    Viewer,
    Adviser,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Player, Role::Voter, Role::Viewer, Role::Adviser];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Player => "player",
            Role::Voter => "voter",
            Role::Viewer => "viewer",
            Role::Adviser => "adviser",
        }
    }

    /// The confirmation screen shows the certificate name only for these roles
    pub fn shows_certificate(&self) -> bool {
        matches!(self, Role::Player | Role::Voter)
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "player" => Ok(Role::Player),
            "voter" => Ok(Role::Voter),
            "viewer" => Ok(Role::Viewer),
            "adviser" => Ok(Role::Adviser),
            other => Err(UnknownVariant { kind: "role", value: other.to_string() }),
        }
    }
}

text_column!(Role);

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Competition {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub entry_open_player: bool,
    pub entry_open_voter: bool,
    pub entry_open_viewer: bool,
    pub entry_open_adviser: bool,
    pub created_at: DateTime<Utc>,
}

impl Competition {
    pub fn is_open_for(&self, role: Role) -> bool {
        match role {
            Role::Player => self.entry_open_player,
            Role::Voter => self.entry_open_voter,
            Role::Viewer => self.entry_open_viewer,
            Role::Adviser => self.entry_open_adviser,
        }
    }

    /// Roles whose registration flag is currently set, in display order
    pub fn open_roles(&self) -> Vec<Role> {
        Role::ALL.into_iter().filter(|role| self.is_open_for(*role)).collect()
    }

    pub fn accepts_registrations(&self) -> bool {
        Role::ALL.iter().any(|role| self.is_open_for(*role))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCompetitionRequest {
    pub name: String,
    pub description: Option<String>,
    pub open_roles: Vec<Role>,
}

/// One entry of a competition's per-role membership set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CompetitionMember {
    pub competition_id: i64,
    pub user_id: i64,
    pub role: Role,
    pub added_at: DateTime<Utc>,
}
