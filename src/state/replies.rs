//! Outbound replies produced by the conversation
//!
//! Replies are transport-neutral: the Telegram layer turns each one into a
//! localized message and the inline keyboard that belongs to it.

use chrono::{NaiveDate, NaiveTime};

use crate::models::{Competition, EditableField, Role, User};
use crate::validation::ValidationError;

/// Free-text questions asked by the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    FirstName,
    LastName,
    Phone,
    Email,
    BirthDate,
    Channel,
    Country,
    City,
    School,
    CertificateName,
    Company,
    Position,
    ImportantInfo,
    ContactMessage,
    SlotDate,
    SlotStart,
    SlotEnd,
    EditValue(EditableField),
}

impl Prompt {
    pub fn key(&self) -> String {
        match self {
            Prompt::FirstName => "prompts.first_name".to_string(),
            Prompt::LastName => "prompts.last_name".to_string(),
            Prompt::Phone => "prompts.phone".to_string(),
            Prompt::Email => "prompts.email".to_string(),
            Prompt::BirthDate => "prompts.birth_date".to_string(),
            Prompt::Channel => "prompts.channel".to_string(),
            Prompt::Country => "prompts.country".to_string(),
            Prompt::City => "prompts.city".to_string(),
            Prompt::School => "prompts.school".to_string(),
            Prompt::CertificateName => "prompts.certificate_name".to_string(),
            Prompt::Company => "prompts.company".to_string(),
            Prompt::Position => "prompts.position".to_string(),
            Prompt::ImportantInfo => "prompts.important_info".to_string(),
            Prompt::ContactMessage => "prompts.contact_message".to_string(),
            Prompt::SlotDate => "prompts.slot_date".to_string(),
            Prompt::SlotStart => "prompts.slot_start".to_string(),
            Prompt::SlotEnd => "prompts.slot_end".to_string(),
            Prompt::EditValue(field) => format!("prompts.edit.{}", field.key()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompetitionChoice {
    pub id: i64,
    pub name: String,
}

impl From<&Competition> for CompetitionChoice {
    fn from(competition: &Competition) -> Self {
        Self { id: competition.id, name: competition.name.clone() }
    }
}

/// Everything the confirmation screen shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationCard {
    pub competition_name: String,
    pub role: Role,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub school: Option<String>,
    /// `None` for roles whose card has no certificate line
    pub certificate_name: Option<Option<String>>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub important_info: Option<String>,
}

impl ConfirmationCard {
    pub fn new(user: &User, competition_name: &str, role: Role) -> Self {
        Self {
            competition_name: competition_name.to_string(),
            role,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone(),
            email: user.email.clone(),
            country: user.country.clone(),
            city: user.city.clone(),
            school: user.school.clone(),
            certificate_name: role.shows_certificate().then(|| user.certificate_name.clone()),
            company: user.company.clone(),
            position: user.position.clone(),
            important_info: user.important_info.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    MainMenu,
    /// Free text arrived while no flow is active
    UseMenu,
    /// Free text arrived where a button is expected
    UseButtons,
    TryAgainLater,
    Cancelled,
    RegistrationClosed,
    ChooseCompetition { competitions: Vec<CompetitionChoice> },
    ChooseRole { competition_name: String, roles: Vec<Role> },
    /// First certificate question, or the second one when `later` is set
    AskCertificate { later: bool },
    Ask { prompt: Prompt },
    Invalid { error: ValidationError },
    Confirmation { card: ConfirmationCard },
    ChooseEditField { fields: Vec<EditableField> },
    FieldUpdated { field: EditableField },
    AskMoreEdits,
    RegistrationSubmitted { competition_name: String, role: Role, already_submitted: bool },
    SlotSaved { date: NaiveDate, start: NaiveTime, end: NaiveTime },
    ContactDelivered,
    ContactFailed,
}

impl Reply {
    pub fn ask(prompt: Prompt) -> Self {
        Reply::Ask { prompt }
    }

    pub fn invalid(error: ValidationError) -> Self {
        Reply::Invalid { error }
    }
}
