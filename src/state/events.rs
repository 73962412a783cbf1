//! Inbound conversation events and callback tokens
//!
//! Button callback data is decoded exactly once, here, into a closed [`Token`]
//! enum. Anything that does not decode is dropped at the boundary.

use std::fmt;

use crate::models::{EditableField, Role};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `/start`
    Start,
    /// `/cancel` or the cancel button
    Cancel,
    Text(String),
    Button(Token),
}

impl Event {
    /// Decode callback data; `None` for unknown tokens
    pub fn from_callback(data: &str) -> Option<Event> {
        Token::parse(data).map(|token| match token {
            Token::Cancel => Event::Cancel,
            other => Event::Button(other),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Event::Start => "start",
            Event::Cancel => "cancel",
            Event::Text(_) => "text",
            Event::Button(_) => "button",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Contact,
    Register,
    Competition(i64),
    Role(Role),
    Confirm(bool),
    EditField(EditableField),
    MoreEdits(bool),
    Certificate(bool),
    Cancel,
}

fn yes_no(value: &str) -> Option<bool> {
    match value {
        "yes" => Some(true),
        "no" => Some(false),
        _ => None,
    }
}

fn yes_no_str(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

impl Token {
    pub fn parse(data: &str) -> Option<Token> {
        match data {
            "cancel" => return Some(Token::Cancel),
            "contact_usn" => return Some(Token::Contact),
            "register_competition" => return Some(Token::Register),
            _ => {}
        }

        if let Some(id) = data.strip_prefix("comp_") {
            return id.parse().ok().map(Token::Competition);
        }
        if let Some(role) = data.strip_prefix("role_") {
            return role.parse().ok().map(Token::Role);
        }
        if let Some(answer) = data.strip_prefix("confirm_") {
            return yes_no(answer).map(Token::Confirm);
        }
        if let Some(answer) = data.strip_prefix("more_edits_") {
            return yes_no(answer).map(Token::MoreEdits);
        }
        if let Some(field) = data.strip_prefix("edit_") {
            return EditableField::from_key(field).map(Token::EditField);
        }
        if let Some(answer) = data.strip_prefix("cert_") {
            return yes_no(answer).map(Token::Certificate);
        }
        None
    }

    /// Callback data string; Telegram caps it at 64 bytes
    pub fn encode(&self) -> String {
        match self {
            Token::Contact => "contact_usn".to_string(),
            Token::Register => "register_competition".to_string(),
            Token::Competition(id) => format!("comp_{id}"),
            Token::Role(role) => format!("role_{}", role.as_str()),
            Token::Confirm(answer) => format!("confirm_{}", yes_no_str(*answer)),
            Token::EditField(field) => format!("edit_{}", field.key()),
            Token::MoreEdits(answer) => format!("more_edits_{}", yes_no_str(*answer)),
            Token::Certificate(answer) => format!("cert_{}", yes_no_str(*answer)),
            Token::Cancel => "cancel".to_string(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_wire_tokens() {
        assert_eq!(Token::parse("comp_12"), Some(Token::Competition(12)));
        assert_eq!(Token::parse("role_voter"), Some(Token::Role(Role::Voter)));
        assert_eq!(Token::parse("confirm_no"), Some(Token::Confirm(false)));
        assert_eq!(Token::parse("edit_important"), Some(Token::EditField(EditableField::Important)));
        assert_eq!(Token::parse("more_edits_yes"), Some(Token::MoreEdits(true)));
        assert_eq!(Token::parse("cert_yes"), Some(Token::Certificate(true)));
        assert_eq!(Token::parse("contact_usn"), Some(Token::Contact));
        assert_eq!(Token::parse("register_competition"), Some(Token::Register));
    }

    #[test]
    fn unknown_tokens_are_dropped() {
        for data in ["comp_x", "role_admin", "confirm_maybe", "edit_age", "", "cert_", "delete_all"] {
            assert_eq!(Token::parse(data), None, "{data}");
        }
    }

    #[test]
    fn encode_is_inverse_of_parse() {
        let tokens = [
            Token::Contact,
            Token::Register,
            Token::Competition(99),
            Token::Role(Role::Adviser),
            Token::Confirm(true),
            Token::EditField(EditableField::Name),
            Token::MoreEdits(false),
            Token::Certificate(false),
            Token::Cancel,
        ];
        for token in tokens {
            assert_eq!(Token::parse(&token.encode()), Some(token));
        }
    }

    #[test]
    fn cancel_button_becomes_cancel_event() {
        assert_eq!(Event::from_callback("cancel"), Some(Event::Cancel));
        assert_eq!(Event::from_callback("comp_1"), Some(Event::Button(Token::Competition(1))));
        assert_eq!(Event::from_callback("nonsense"), None);
    }
}
