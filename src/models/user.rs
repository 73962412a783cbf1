//! User profile model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub chat_id: i64,
    pub telegram_id: Option<i64>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub classic_rating: Option<f64>,
    pub quick_rating: Option<f64>,
    pub team_rating: Option<f64>,
    pub about: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub channel_name: Option<String>,
    pub certificate_name: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub school: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub important_info: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Current value of a single editable column
    pub fn column_value(&self, column: ProfileColumn) -> Option<&str> {
        let value = match column {
            ProfileColumn::FirstName => &self.first_name,
            ProfileColumn::LastName => &self.last_name,
            ProfileColumn::Phone => &self.phone,
            ProfileColumn::Email => &self.email,
            ProfileColumn::City => &self.city,
            ProfileColumn::School => &self.school,
            ProfileColumn::CertificateName => &self.certificate_name,
            ProfileColumn::ImportantInfo => &self.important_info,
        };
        value.as_deref()
    }

    pub fn set_column(&mut self, column: ProfileColumn, value: Option<String>) {
        let slot = match column {
            ProfileColumn::FirstName => &mut self.first_name,
            ProfileColumn::LastName => &mut self.last_name,
            ProfileColumn::Phone => &mut self.phone,
            ProfileColumn::Email => &mut self.email,
            ProfileColumn::City => &mut self.city,
            ProfileColumn::School => &mut self.school,
            ProfileColumn::CertificateName => &mut self.certificate_name,
            ProfileColumn::ImportantInfo => &mut self.important_info,
        };
        *slot = value;
    }

    /// Profiles created by `/start` carry only the Telegram handle until the
    /// registration chain fills in contact data.
    pub fn has_contact_details(&self) -> bool {
        self.phone.is_some() || self.email.is_some()
    }
}

/// Identity of the Telegram account behind a chat, as seen on `/start`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramIdentity {
    pub chat_id: i64,
    pub telegram_id: Option<i64>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Profile answers collected during the new-user chain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileDraft {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub channel_name: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub school: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub certificate_name: Option<String>,
    pub important_info: Option<String>,
}

/// Full profile write keyed by chat id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertProfileRequest {
    pub chat_id: i64,
    pub telegram_id: Option<i64>,
    pub username: Option<String>,
    pub role: Option<Role>,
    pub draft: ProfileDraft,
}

/// Fields a user may change from the confirmation screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditableField {
    Name,
    Phone,
    Email,
    City,
    School,
    Certificate,
    Important,
}

impl EditableField {
    pub const ALL: [EditableField; 7] = [
        EditableField::Name,
        EditableField::Phone,
        EditableField::Email,
        EditableField::City,
        EditableField::School,
        EditableField::Certificate,
        EditableField::Important,
    ];

    /// Key used in callback tokens and message catalogs
    pub fn key(&self) -> &'static str {
        match self {
            EditableField::Name => "name",
            EditableField::Phone => "phone",
            EditableField::Email => "email",
            EditableField::City => "city",
            EditableField::School => "school",
            EditableField::Certificate => "certificate",
            EditableField::Important => "important",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    /// Column written by a single-value edit; `Name` spans two columns
    pub fn column(&self) -> ProfileColumn {
        match self {
            EditableField::Name => ProfileColumn::FirstName,
            EditableField::Phone => ProfileColumn::Phone,
            EditableField::Email => ProfileColumn::Email,
            EditableField::City => ProfileColumn::City,
            EditableField::School => ProfileColumn::School,
            EditableField::Certificate => ProfileColumn::CertificateName,
            EditableField::Important => ProfileColumn::ImportantInfo,
        }
    }
}

/// Profile columns that can be updated one at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProfileColumn {
    FirstName,
    LastName,
    Phone,
    Email,
    City,
    School,
    CertificateName,
    ImportantInfo,
}

impl ProfileColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileColumn::FirstName => "first_name",
            ProfileColumn::LastName => "last_name",
            ProfileColumn::Phone => "phone",
            ProfileColumn::Email => "email",
            ProfileColumn::City => "city",
            ProfileColumn::School => "school",
            ProfileColumn::CertificateName => "certificate_name",
            ProfileColumn::ImportantInfo => "important_info",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editable_field_keys_round_trip() {
        for field in EditableField::ALL {
            assert_eq!(EditableField::from_key(field.key()), Some(field));
        }
        assert_eq!(EditableField::from_key("birth_date"), None);
    }

    #[test]
    fn certificate_edit_targets_certificate_column() {
        assert_eq!(EditableField::Certificate.column().as_str(), "certificate_name");
        assert_eq!(EditableField::Important.column().as_str(), "important_info");
    }
}
