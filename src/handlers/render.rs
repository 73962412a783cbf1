//! Turn conversation replies into localized chat messages

use teloxide::types::InlineKeyboardMarkup;

use super::keyboards;
use crate::i18n::I18n;
use crate::models::Role;
use crate::state::{ConfirmationCard, Reply, Token};
use crate::utils::helpers::or_dash;

/// Text plus the optional inline keyboard to attach
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub text: String,
    pub keyboard: Option<InlineKeyboardMarkup>,
}

impl Rendered {
    fn text(text: String) -> Self {
        Self { text, keyboard: None }
    }

    fn with_keyboard(text: String, keyboard: InlineKeyboardMarkup) -> Self {
        Self { text, keyboard: Some(keyboard) }
    }
}

fn role_label(i18n: &I18n, lang: &str, role: Role) -> String {
    i18n.t(&format!("roles.{}", role.as_str()), lang, None)
}

fn confirmation_text(card: &ConfirmationCard, i18n: &I18n, lang: &str) -> String {
    let name = [card.first_name.as_deref(), card.last_name.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    let line = |key: &str, value: Option<&str>| i18n.t_with(key, lang, &[("value", or_dash(value))]);

    let mut lines = vec![
        i18n.t_with("confirmation.greeting", lang, &[("name", or_dash(Some(name.as_str())))]),
        i18n.t("confirmation.check", lang, None),
        line("confirmation.username", card.username.as_deref()),
        line("confirmation.phone", card.phone.as_deref()),
        line("confirmation.email", card.email.as_deref()),
        line("confirmation.country", card.country.as_deref()),
        line("confirmation.city", card.city.as_deref()),
        line("confirmation.school", card.school.as_deref()),
    ];
    if let Some(certificate) = &card.certificate_name {
        lines.push(line("confirmation.certificate", certificate.as_deref()));
    }
    lines.push(line("confirmation.company", card.company.as_deref()));
    lines.push(line("confirmation.position", card.position.as_deref()));
    lines.push(line("confirmation.important", card.important_info.as_deref()));
    lines.push(String::new());
    lines.push(i18n.t("confirmation.question", lang, None));

    lines.join("\n")
}

pub fn render(reply: &Reply, i18n: &I18n, lang: &str) -> Rendered {
    match reply {
        Reply::MainMenu => Rendered::with_keyboard(i18n.t("menu.welcome", lang, None), keyboards::main_menu(i18n, lang)),
        Reply::UseMenu => Rendered::text(i18n.t("common.use_menu", lang, None)),
        Reply::UseButtons => Rendered::text(i18n.t("common.use_buttons", lang, None)),
        Reply::TryAgainLater => Rendered::text(i18n.t("common.try_again_later", lang, None)),
        Reply::Cancelled => Rendered::text(i18n.t("common.cancelled", lang, None)),
        Reply::RegistrationClosed => Rendered::text(i18n.t("registration.closed", lang, None)),
        Reply::ChooseCompetition { competitions } => Rendered::with_keyboard(
            i18n.t("registration.choose_competition", lang, None),
            keyboards::competitions(competitions, i18n, lang),
        ),
        Reply::ChooseRole { competition_name, roles } => Rendered::with_keyboard(
            i18n.t_with("registration.choose_role", lang, &[("competition", competition_name.as_str())]),
            keyboards::roles(roles, i18n, lang),
        ),
        Reply::AskCertificate { later } => {
            let key = if *later { "registration.certificate_question_later" } else { "registration.certificate_question" };
            Rendered::with_keyboard(i18n.t(key, lang, None), keyboards::yes_no(Token::Certificate, i18n, lang))
        }
        Reply::Ask { prompt } => Rendered::text(i18n.t(&prompt.key(), lang, None)),
        Reply::Invalid { error } => Rendered::text(i18n.t(error.message_key(), lang, None)),
        Reply::Confirmation { card } => Rendered::with_keyboard(
            confirmation_text(card, i18n, lang),
            keyboards::yes_no(Token::Confirm, i18n, lang),
        ),
        Reply::ChooseEditField { fields } => Rendered::with_keyboard(
            i18n.t("edit.choose", lang, None),
            keyboards::edit_fields(fields, i18n, lang),
        ),
        Reply::FieldUpdated { .. } => Rendered::text(i18n.t("edit.updated", lang, None)),
        Reply::AskMoreEdits => {
            Rendered::with_keyboard(i18n.t("edit.more", lang, None), keyboards::yes_no(Token::MoreEdits, i18n, lang))
        }
        Reply::RegistrationSubmitted { competition_name, role, already_submitted } => {
            let key = if *already_submitted { "registration.already_submitted" } else { "registration.submitted" };
            let role = role_label(i18n, lang, *role);
            Rendered::text(i18n.t_with(key, lang, &[("role", role.as_str()), ("competition", competition_name.as_str())]))
        }
        Reply::SlotSaved { date, start, end } => Rendered::text(i18n.t_with(
            "slot.saved",
            lang,
            &[
                ("date", date.format("%Y-%m-%d").to_string().as_str()),
                ("start", start.format("%H:%M").to_string().as_str()),
                ("end", end.format("%H:%M").to_string().as_str()),
            ],
        )),
        Reply::ContactDelivered => Rendered::text(i18n.t("contact.delivered", lang, None)),
        Reply::ContactFailed => Rendered::text(i18n.t("contact.failed", lang, None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::I18nConfig;
    use crate::state::Prompt;
    use chrono::{NaiveDate, NaiveTime};

    fn i18n() -> I18n {
        I18n::builtin(&I18nConfig::default()).unwrap()
    }

    fn card(role: Role) -> ConfirmationCard {
        ConfirmationCard {
            competition_name: "Spring Cup".into(),
            role,
            username: Some("ivan".into()),
            first_name: Some("Иван".into()),
            last_name: Some("Петров".into()),
            phone: Some("+1 555-0100".into()),
            email: Some("a@b.com".into()),
            country: Some("Россия".into()),
            city: None,
            school: None,
            certificate_name: role.shows_certificate().then_some(None),
            company: None,
            position: None,
            important_info: None,
        }
    }

    #[test]
    fn confirmation_card_hides_certificate_for_viewers() {
        let i18n = i18n();
        let viewer = render(&Reply::Confirmation { card: card(Role::Viewer) }, &i18n, "ru");
        assert!(viewer.text.starts_with("Добрый день, Иван Петров!"));
        assert!(viewer.text.contains("Город: —"));
        assert!(!viewer.text.contains("сертификата"));

        let voter = render(&Reply::Confirmation { card: card(Role::Voter) }, &i18n, "ru");
        assert!(voter.text.contains("Имя и фамилия для сертификата: —"));
        assert!(voter.keyboard.is_some());
    }

    #[test]
    fn submission_uses_role_label() {
        let rendered = render(
            &Reply::RegistrationSubmitted {
                competition_name: "Spring Cup".into(),
                role: Role::Adviser,
                already_submitted: false,
            },
            &i18n(),
            "ru",
        );
        assert_eq!(rendered.text, "✅ Отлично! Вы зарегистрированы как Секундант на Spring Cup.");
    }

    #[test]
    fn slot_saved_shows_the_window() {
        let rendered = render(
            &Reply::SlotSaved {
                date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
                start: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                end: NaiveTime::from_hms_opt(12, 30, 0).unwrap(),
            },
            &i18n(),
            "en",
        );
        assert!(rendered.text.contains("2026-03-15, 10:00–12:30"));
    }

    #[test]
    fn prompts_have_no_keyboard() {
        let rendered = render(&Reply::ask(Prompt::SlotEnd), &i18n(), "ru");
        assert!(rendered.keyboard.is_none());
        assert!(rendered.text.contains("окончания"));
    }
}
