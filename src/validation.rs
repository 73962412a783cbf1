//! Free-text input validators
//!
//! Every function here is pure: it either returns the typed value or the
//! reason the input was refused. Callers re-prompt on `Err` and stay in the
//! same conversation state.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, NaiveTime};
use regex::Regex;
use thiserror::Error;

/// Oldest accepted birth year
pub const MIN_BIRTH_YEAR: i32 = 1900;

/// Minimum number of digits a phone number must contain
pub const MIN_PHONE_DIGITS: usize = 5;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("Failed to compile email regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("date must be in YYYY-MM-DD format")]
    InvalidDate,
    #[error("birth date cannot be in the future")]
    FutureBirthDate,
    #[error("birth year must be {MIN_BIRTH_YEAR} or later")]
    BirthDateTooOld,
    #[error("time must be in HH:MM format")]
    InvalidTime,
    #[error("end time must be later than start time")]
    EndNotAfterStart,
    #[error("phone number must contain at least {MIN_PHONE_DIGITS} digits")]
    InvalidPhone,
    #[error("email address is not valid")]
    InvalidEmail,
    #[error("value must not be empty")]
    Empty,
}

impl ValidationError {
    /// Message catalog key for the re-prompt shown to the user
    pub fn message_key(&self) -> &'static str {
        match self {
            ValidationError::InvalidDate => "validation.invalid_date",
            ValidationError::FutureBirthDate => "validation.future_birth_date",
            ValidationError::BirthDateTooOld => "validation.birth_date_too_old",
            ValidationError::InvalidTime => "validation.invalid_time",
            ValidationError::EndNotAfterStart => "validation.end_not_after_start",
            ValidationError::InvalidPhone => "validation.invalid_phone",
            ValidationError::InvalidEmail => "validation.invalid_email",
            ValidationError::Empty => "validation.empty",
        }
    }
}

/// Strict `YYYY-MM-DD`
pub fn parse_date(input: &str) -> Result<NaiveDate, ValidationError> {
    let input = input.trim();
    // chrono accepts unpadded fields, so check the shape first
    let shaped = input.len() == 10
        && input.char_indices().all(|(i, c)| match i {
            4 | 7 => c == '-',
            _ => c.is_ascii_digit(),
        });
    if !shaped {
        return Err(ValidationError::InvalidDate);
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate)
}

/// Birth date: a strict date that is not after `today` and not before 1900
pub fn parse_birth_date(input: &str, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    let date = parse_date(input)?;
    if date > today {
        return Err(ValidationError::FutureBirthDate);
    }
    if date.year() < MIN_BIRTH_YEAR {
        return Err(ValidationError::BirthDateTooOld);
    }
    Ok(date)
}

/// Strict 24-hour `HH:MM`
pub fn parse_time(input: &str) -> Result<NaiveTime, ValidationError> {
    let input = input.trim();
    let bytes = input.as_bytes();
    let shaped = bytes.len() == 5
        && bytes[2] == b':'
        && [0, 1, 3, 4].iter().all(|&i| bytes[i].is_ascii_digit());
    if !shaped {
        return Err(ValidationError::InvalidTime);
    }
    NaiveTime::parse_from_str(input, "%H:%M").map_err(|_| ValidationError::InvalidTime)
}

/// Parse an end time and require it to be strictly after `start`
pub fn validate_slot_end(input: &str, start: NaiveTime) -> Result<NaiveTime, ValidationError> {
    let end = parse_time(input)?;
    if end <= start {
        return Err(ValidationError::EndNotAfterStart);
    }
    Ok(end)
}

/// Accepts any text with at least five digits; the trimmed original text is kept.
pub fn parse_phone(input: &str) -> Result<String, ValidationError> {
    let digits = input.chars().filter(|c| c.is_ascii_digit()).count();
    if digits < MIN_PHONE_DIGITS {
        return Err(ValidationError::InvalidPhone);
    }
    Ok(input.trim().to_string())
}

pub fn parse_email(input: &str) -> Result<String, ValidationError> {
    let input = input.trim();
    if !EMAIL_RE.is_match(input) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(input.to_string())
}

/// Non-empty trimmed text
pub fn parse_required(input: &str) -> Result<String, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::Empty);
    }
    Ok(input.to_string())
}

/// "Skip" sentinel for optional answers: a localized "no" or a bare dash
pub fn is_skip(input: &str) -> bool {
    let input = input.trim().to_lowercase();
    matches!(input.as_str(), "нет" | "no" | "-" | "—")
}

/// Optional answer: `None` for the skip sentinel, otherwise the trimmed text
pub fn parse_optional(input: &str) -> Result<Option<String>, ValidationError> {
    if is_skip(input) {
        return Ok(None);
    }
    parse_required(input).map(Some)
}

/// Optional birth date: skip sentinel or a valid birth date
pub fn parse_optional_birth_date(input: &str, today: NaiveDate) -> Result<Option<NaiveDate>, ValidationError> {
    if is_skip(input) {
        return Ok(None);
    }
    parse_birth_date(input, today).map(Some)
}
