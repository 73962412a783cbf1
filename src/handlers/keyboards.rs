//! Inline keyboards, one per button-driven state

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::i18n::I18n;
use crate::models::{EditableField, Role};
use crate::state::{CompetitionChoice, Token};

fn button(text: impl Into<String>, token: Token) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, token.encode())
}

fn cancel_row(i18n: &I18n, lang: &str) -> Vec<InlineKeyboardButton> {
    vec![button(i18n.t("common.cancel_button", lang, None), Token::Cancel)]
}

pub fn main_menu(i18n: &I18n, lang: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button(i18n.t("menu.contact_button", lang, None), Token::Contact)],
        vec![button(i18n.t("menu.register_button", lang, None), Token::Register)],
    ])
}

pub fn competitions(competitions: &[CompetitionChoice], i18n: &I18n, lang: &str) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = competitions
        .iter()
        .map(|c| vec![button(c.name.clone(), Token::Competition(c.id))])
        .collect();
    rows.push(cancel_row(i18n, lang));
    InlineKeyboardMarkup::new(rows)
}

pub fn roles(roles: &[Role], i18n: &I18n, lang: &str) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = roles
        .iter()
        .map(|role| vec![button(i18n.t(&format!("roles.{}", role.as_str()), lang, None), Token::Role(*role))])
        .collect();
    rows.push(cancel_row(i18n, lang));
    InlineKeyboardMarkup::new(rows)
}

/// Yes/no pair for `token(true)` / `token(false)`, then cancel
pub fn yes_no(token: fn(bool) -> Token, i18n: &I18n, lang: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button(i18n.t("common.yes", lang, None), token(true))],
        vec![button(i18n.t("common.no", lang, None), token(false))],
        cancel_row(i18n, lang),
    ])
}

pub fn edit_fields(fields: &[EditableField], i18n: &I18n, lang: &str) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = fields
        .iter()
        .map(|field| {
            vec![button(i18n.t(&format!("edit.fields.{}", field.key()), lang, None), Token::EditField(*field))]
        })
        .collect();
    rows.push(cancel_row(i18n, lang));
    InlineKeyboardMarkup::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::I18nConfig;
    use teloxide::types::InlineKeyboardButtonKind;

    fn callbacks(markup: &InlineKeyboardMarkup) -> Vec<String> {
        markup
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|b| match &b.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn role_keyboard_offers_open_roles_and_cancel() {
        let i18n = I18n::builtin(&I18nConfig::default()).unwrap();
        let markup = roles(&[Role::Voter, Role::Viewer], &i18n, "ru");
        assert_eq!(callbacks(&markup), vec!["role_voter", "role_viewer", "cancel"]);
        assert_eq!(markup.inline_keyboard[0][0].text, "Судья");
    }

    #[test]
    fn confirmation_buttons_use_confirm_tokens() {
        let i18n = I18n::builtin(&I18nConfig::default()).unwrap();
        let markup = yes_no(Token::Confirm, &i18n, "ru");
        assert_eq!(callbacks(&markup), vec!["confirm_yes", "confirm_no", "cancel"]);
    }

    #[test]
    fn every_yes_no_question_can_be_cancelled() {
        let i18n = I18n::builtin(&I18nConfig::default()).unwrap();
        let questions: [fn(bool) -> Token; 2] = [Token::Certificate, Token::MoreEdits];
        for token in questions {
            let markup = yes_no(token, &i18n, "en");
            assert_eq!(callbacks(&markup).last().map(String::as_str), Some("cancel"));
        }
    }

    #[test]
    fn main_menu_tokens() {
        let i18n = I18n::builtin(&I18nConfig::default()).unwrap();
        assert_eq!(callbacks(&main_menu(&i18n, "ru")), vec!["contact_usn", "register_competition"]);
    }
}
