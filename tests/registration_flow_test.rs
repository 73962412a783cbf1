//! Conversation scenarios driven through the engine over the in-memory store

mod helpers;

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use helpers::*;
use RegistrationDesk::models::{EditableField, RequestStatus, Role};
use RegistrationDesk::state::{Event, Prompt, Reply, State, Token};
use RegistrationDesk::validation::ValidationError;

const PROFILE_TO_SCHOOL: [&str; 9] = [
    "Иван",
    "Петров",
    "+7 999 123-45-67",
    "ivan@example.com",
    "1990-05-01",
    "-",
    "Россия",
    "Москва",
    "USN",
];

fn ask(prompt: Prompt) -> Reply {
    Reply::ask(prompt)
}

/// /start, register, pick `role` in the only open competition
async fn open_registration(ctx: &TestContext, chat_id: i64, role: Role) -> Vec<Reply> {
    assert_eq!(ctx.send(chat_id, Event::Start).await, vec![Reply::MainMenu]);
    let replies = ctx.press(chat_id, Token::Register).await;
    assert_matches!(replies.as_slice(), [Reply::ChooseRole { .. }]);
    ctx.press(chat_id, Token::Role(role)).await
}

#[tokio::test]
async fn new_viewer_registers_for_spring_cup() {
    let ctx = TestContext::new();
    let chat_id = 101;
    ctx.seed_competition("Spring Cup", &[Role::Viewer]).await;

    assert_eq!(ctx.send(chat_id, Event::Start).await, vec![Reply::MainMenu]);
    assert_eq!(
        ctx.press(chat_id, Token::Register).await,
        vec![Reply::ChooseRole { competition_name: "Spring Cup".to_string(), roles: vec![Role::Viewer] }]
    );
    assert_eq!(ctx.press(chat_id, Token::Role(Role::Viewer)).await, vec![ask(Prompt::FirstName)]);

    assert_eq!(ctx.answer_all(chat_id, &PROFILE_TO_SCHOOL).await, vec![Reply::AskCertificate { later: false }]);
    assert_eq!(ctx.press(chat_id, Token::Certificate(false)).await, vec![ask(Prompt::Company)]);
    assert_eq!(ctx.text(chat_id, "ACME").await, vec![ask(Prompt::Position)]);
    assert_eq!(ctx.text(chat_id, "Engineer").await, vec![Reply::AskCertificate { later: true }]);

    let replies = ctx.press(chat_id, Token::Certificate(false)).await;
    let [Reply::Confirmation { card }] = replies.as_slice() else {
        panic!("expected the confirmation screen, got {replies:?}");
    };
    assert_eq!(card.competition_name, "Spring Cup");
    assert_eq!(card.first_name.as_deref(), Some("Иван"));
    assert_eq!(card.email.as_deref(), Some("ivan@example.com"));
    assert_eq!(card.certificate_name, None, "viewers never see the certificate line");
    assert_eq!(ctx.state(chat_id).await, State::ConfirmData);

    // Nothing is submitted before confirmation
    assert!(ctx.store.requests().await.is_empty());

    assert_eq!(
        ctx.press(chat_id, Token::Confirm(true)).await,
        vec![
            Reply::RegistrationSubmitted {
                competition_name: "Spring Cup".to_string(),
                role: Role::Viewer,
                already_submitted: false,
            },
            Reply::MainMenu,
        ]
    );
    assert_eq!(ctx.state(chat_id).await, State::Idle);

    let requests = ctx.store.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].status, RequestStatus::Pending);
    assert_eq!(requests[0].role, Role::Viewer);
    assert_eq!(requests[0].user_first_name, "Иван");
    assert_eq!(requests[0].user_phone, "+7 999 123-45-67");

    let users = ctx.store.users().await;
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].birth_date, NaiveDate::from_ymd_opt(1990, 5, 1));
    assert_eq!(users[0].channel_name, None);
    assert_eq!(users[0].company.as_deref(), Some("ACME"));

    // Pending requests grant no membership
    let competition_id = requests[0].competition_id;
    assert!(ctx.stores().competitions.members(competition_id, Role::Viewer).await.unwrap().is_empty());
}

#[tokio::test]
async fn existing_voter_confirms_and_leaves_a_time_slot() {
    let ctx = TestContext::new();
    let chat_id = 202;
    let competition = ctx.seed_competition("Spring Cup", &[Role::Voter, Role::Viewer]).await;
    let voter = ctx.seed_profile(chat_id, Role::Voter).await;

    let replies = open_registration(&ctx, chat_id, Role::Voter).await;
    let [Reply::Confirmation { card }] = replies.as_slice() else {
        panic!("existing users skip the profile chain, got {replies:?}");
    };
    assert_eq!(card.certificate_name, Some(None));

    assert_eq!(ctx.press(chat_id, Token::Confirm(true)).await, vec![ask(Prompt::SlotDate)]);
    assert_eq!(ctx.text(chat_id, "2026-03-15").await, vec![ask(Prompt::SlotStart)]);
    assert_eq!(ctx.text(chat_id, "10:00").await, vec![ask(Prompt::SlotEnd)]);

    assert_eq!(
        ctx.text(chat_id, "09:00").await,
        vec![Reply::invalid(ValidationError::EndNotAfterStart), ask(Prompt::SlotEnd)]
    );
    assert_eq!(ctx.state(chat_id).await, State::VoterSlotEnd);

    let date = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
    let start = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
    let end = NaiveTime::from_hms_opt(12, 30, 0).unwrap();
    assert_eq!(
        ctx.text(chat_id, "12:30").await,
        vec![Reply::SlotSaved { date, start, end }, Reply::MainMenu]
    );

    let slots = ctx.store.all_slots().await;
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].voter_id, voter.id);
    assert_eq!(slots[0].competition_id, competition.id);
    assert_eq!((slots[0].slot_date, slots[0].start_time, slots[0].end_time), (date, start, end));

    let requests = ctx.store.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].user_id, voter.id);
    assert_eq!(requests[0].role, Role::Voter);
}

#[tokio::test]
async fn slot_date_and_start_reject_bad_shapes() {
    let ctx = TestContext::new();
    let chat_id = 203;
    ctx.seed_competition("Spring Cup", &[Role::Voter]).await;
    ctx.seed_profile(chat_id, Role::Voter).await;

    open_registration(&ctx, chat_id, Role::Voter).await;
    ctx.press(chat_id, Token::Confirm(true)).await;

    assert_eq!(
        ctx.text(chat_id, "15.03.2026").await,
        vec![Reply::invalid(ValidationError::InvalidDate), ask(Prompt::SlotDate)]
    );
    ctx.text(chat_id, "2026-03-15").await;
    assert_eq!(
        ctx.text(chat_id, "25:00").await,
        vec![Reply::invalid(ValidationError::InvalidTime), ask(Prompt::SlotStart)]
    );
    assert_eq!(ctx.state(chat_id).await, State::VoterSlotStart);
}

/// Walk a new voter through both certificate questions
async fn certificate_path(first: bool, second: bool) -> (State, Option<String>, Option<String>) {
    let ctx = TestContext::new();
    let chat_id = 300;
    ctx.seed_competition("Spring Cup", &[Role::Voter]).await;

    assert_eq!(open_registration(&ctx, chat_id, Role::Voter).await, vec![ask(Prompt::FirstName)]);
    ctx.answer_all(chat_id, &PROFILE_TO_SCHOOL).await;

    ctx.press(chat_id, Token::Certificate(first)).await;
    if first {
        assert_eq!(ctx.state(chat_id).await, State::NewUserCertificateName);
        assert_eq!(ctx.text(chat_id, "Иван Петров").await, vec![ask(Prompt::Company)]);
    }
    ctx.answer_all(chat_id, &["ACME", "Engineer"]).await;
    assert_eq!(ctx.state(chat_id).await, State::NewUserCertificateLater);

    let replies = ctx.press(chat_id, Token::Certificate(second)).await;
    let after_second = ctx.state(chat_id).await;
    match after_second {
        State::NewUserImportantInfo => {
            assert_eq!(replies, vec![ask(Prompt::ImportantInfo)]);
            ctx.text(chat_id, "Выступаю за клуб").await;
        }
        State::NewUserLateCertificateName => {
            assert_eq!(replies, vec![ask(Prompt::CertificateName)]);
            assert_eq!(ctx.text(chat_id, "I. Petrov").await, vec![ask(Prompt::ImportantInfo)]);
            ctx.text(chat_id, "Выступаю за клуб").await;
        }
        State::ConfirmData => assert_matches!(replies.as_slice(), [Reply::Confirmation { .. }]),
        other => panic!("unexpected state {other}"),
    }
    assert_eq!(ctx.state(chat_id).await, State::ConfirmData);

    let users = ctx.store.users().await;
    (after_second, users[0].certificate_name.clone(), users[0].important_info.clone())
}

#[tokio::test]
async fn certificate_answers_resolve_by_the_pair_alone() {
    let info = Some("Выступаю за клуб".to_string());
    assert_eq!(
        certificate_path(true, true).await,
        (State::NewUserImportantInfo, Some("Иван Петров".to_string()), info.clone())
    );
    assert_eq!(
        certificate_path(true, false).await,
        (State::ConfirmData, Some("Иван Петров".to_string()), None)
    );
    assert_eq!(
        certificate_path(false, true).await,
        (State::NewUserLateCertificateName, Some("I. Petrov".to_string()), info)
    );
    assert_eq!(certificate_path(false, false).await, (State::ConfirmData, None, None));
}

#[tokio::test]
async fn birth_date_is_re_asked_until_valid_or_skipped() {
    let ctx = TestContext::new();
    let chat_id = 404;
    ctx.seed_competition("Spring Cup", &[Role::Player]).await;

    open_registration(&ctx, chat_id, Role::Player).await;
    assert_eq!(ctx.answer_all(chat_id, &PROFILE_TO_SCHOOL[..4]).await, vec![ask(Prompt::BirthDate)]);

    for (input, error) in [
        ("1899-12-31", ValidationError::BirthDateTooOld),
        ("2030-01-01", ValidationError::FutureBirthDate),
        ("1.5.1990", ValidationError::InvalidDate),
    ] {
        assert_eq!(ctx.text(chat_id, input).await, vec![Reply::invalid(error), ask(Prompt::BirthDate)], "{input}");
        assert_eq!(ctx.state(chat_id).await, State::NewUserBirthDate);
    }

    assert_eq!(ctx.text(chat_id, "нет").await, vec![ask(Prompt::Channel)]);
    let session = ctx.engine.session(chat_id).await.unwrap().unwrap();
    assert_eq!(session.draft.birth_date, None);
}

#[tokio::test]
async fn invalid_phone_and_email_are_re_asked() {
    let ctx = TestContext::new();
    let chat_id = 405;
    ctx.seed_competition("Spring Cup", &[Role::Adviser]).await;

    open_registration(&ctx, chat_id, Role::Adviser).await;
    ctx.answer_all(chat_id, &["Иван", "Петров"]).await;

    assert_eq!(
        ctx.text(chat_id, "12-34").await,
        vec![Reply::invalid(ValidationError::InvalidPhone), ask(Prompt::Phone)]
    );
    assert_eq!(ctx.text(chat_id, "+7 999 123-45-67").await, vec![ask(Prompt::Email)]);
    assert_eq!(
        ctx.text(chat_id, "ivan@").await,
        vec![Reply::invalid(ValidationError::InvalidEmail), ask(Prompt::Email)]
    );
    assert_eq!(ctx.state(chat_id).await, State::NewUserEmail);
}

#[tokio::test]
async fn cancel_discards_the_draft() {
    let ctx = TestContext::new();
    let chat_id = 406;
    ctx.seed_competition("Spring Cup", &[Role::Viewer]).await;

    open_registration(&ctx, chat_id, Role::Viewer).await;
    ctx.answer_all(chat_id, &["Иван", "Петров"]).await;

    assert_eq!(ctx.send(chat_id, Event::Cancel).await, vec![Reply::Cancelled, Reply::MainMenu]);
    let session = ctx.engine.session(chat_id).await.unwrap().unwrap();
    assert_eq!(session.state, State::Idle);
    assert_eq!(session.draft.first_name, None);
    assert_eq!(session.competition_id, None);
}

#[tokio::test]
async fn closed_registration_returns_to_menu() {
    let ctx = TestContext::new();
    let chat_id = 407;
    ctx.seed_competition("Archive Cup", &[]).await;

    ctx.send(chat_id, Event::Start).await;
    assert_eq!(
        ctx.press(chat_id, Token::Register).await,
        vec![Reply::RegistrationClosed, Reply::MainMenu]
    );
}

#[tokio::test]
async fn several_competitions_offer_a_chooser() {
    let ctx = TestContext::new();
    let chat_id = 408;
    ctx.seed_competition("Spring Cup", &[Role::Viewer]).await;
    let autumn = ctx.seed_competition("Autumn Cup", &[Role::Player, Role::Viewer]).await;

    ctx.send(chat_id, Event::Start).await;
    let replies = ctx.press(chat_id, Token::Register).await;
    let [Reply::ChooseCompetition { competitions }] = replies.as_slice() else {
        panic!("expected a competition chooser, got {replies:?}");
    };
    assert_eq!(competitions.len(), 2);

    assert_eq!(
        ctx.press(chat_id, Token::Competition(autumn.id)).await,
        vec![Reply::ChooseRole { competition_name: "Autumn Cup".to_string(), roles: vec![Role::Player, Role::Viewer] }]
    );
}

#[tokio::test]
async fn resubmission_reports_existing_request() {
    let ctx = TestContext::new();
    let chat_id = 409;
    ctx.seed_competition("Spring Cup", &[Role::Viewer]).await;
    ctx.seed_profile(chat_id, Role::Viewer).await;

    for already_submitted in [false, true] {
        open_registration(&ctx, chat_id, Role::Viewer).await;
        let replies = ctx.press(chat_id, Token::Confirm(true)).await;
        assert_matches!(
            replies.as_slice(),
            [Reply::RegistrationSubmitted { already_submitted: flag, .. }, Reply::MainMenu] if *flag == already_submitted
        );
    }
    assert_eq!(ctx.store.requests().await.len(), 1);
}

#[tokio::test]
async fn editing_a_field_updates_profile_and_logs_the_change() {
    let ctx = TestContext::new();
    let chat_id = 410;
    ctx.seed_competition("Spring Cup", &[Role::Viewer]).await;
    let user = ctx.seed_profile(chat_id, Role::Viewer).await;

    open_registration(&ctx, chat_id, Role::Viewer).await;
    let replies = ctx.press(chat_id, Token::Confirm(false)).await;
    assert_matches!(replies.as_slice(), [Reply::ChooseEditField { fields }] if fields.contains(&EditableField::Phone));

    assert_eq!(
        ctx.press(chat_id, Token::EditField(EditableField::Phone)).await,
        vec![ask(Prompt::EditValue(EditableField::Phone))]
    );
    assert_eq!(
        ctx.text(chat_id, "12").await,
        vec![Reply::invalid(ValidationError::InvalidPhone), ask(Prompt::EditValue(EditableField::Phone))]
    );
    assert_eq!(
        ctx.text(chat_id, "+7 900 111-22-33").await,
        vec![Reply::FieldUpdated { field: EditableField::Phone }, Reply::AskMoreEdits]
    );

    let replies = ctx.press(chat_id, Token::MoreEdits(false)).await;
    let [Reply::Confirmation { card }] = replies.as_slice() else {
        panic!("expected the confirmation screen again, got {replies:?}");
    };
    assert_eq!(card.phone.as_deref(), Some("+7 900 111-22-33"));

    let log = ctx.store.change_log().await;
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].user_id, user.id);
    assert_eq!(log[0].field_name, "phone");
    assert_eq!(log[0].old_value.as_deref(), Some("+7 900 000-00-01"));
    assert_eq!(log[0].new_value.as_deref(), Some("+7 900 111-22-33"));
}

#[tokio::test]
async fn contact_message_is_emailed_to_the_team() {
    let ctx = TestContext::new();
    let chat_id = 501;

    ctx.send(chat_id, Event::Start).await;
    assert_eq!(ctx.press(chat_id, Token::Contact).await, vec![ask(Prompt::ContactMessage)]);
    assert_eq!(
        ctx.text(chat_id, "   ").await,
        vec![Reply::invalid(ValidationError::Empty), ask(Prompt::ContactMessage)]
    );
    assert_eq!(
        ctx.text(chat_id, "Когда начало?").await,
        vec![Reply::ContactDelivered, Reply::MainMenu]
    );

    let sent = ctx.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipients, vec![CONTACT_RECIPIENT.to_string()]);
    assert_eq!(sent[0].subject, "USN contact message from @user501");
    assert!(sent[0].body.ends_with("Когда начало?"));

    let stored = ctx.store.contact_messages().await;
    assert_eq!(stored.len(), 1);
    assert!(stored[0].delivered);
}

#[tokio::test]
async fn contact_message_failure_is_reported_and_kept() {
    let ctx = TestContext::new();
    let chat_id = 502;
    ctx.mailer.set_failing(true);

    ctx.send(chat_id, Event::Start).await;
    ctx.press(chat_id, Token::Contact).await;
    assert_eq!(ctx.text(chat_id, "Здравствуйте").await, vec![Reply::ContactFailed, Reply::MainMenu]);
    assert_eq!(ctx.state(chat_id).await, State::Idle);

    let stored = ctx.store.contact_messages().await;
    assert_eq!(stored.len(), 1);
    assert!(!stored[0].delivered);
    assert_eq!(stored[0].body, "Здравствуйте");
}

#[tokio::test]
async fn delivered_contact_message_is_not_resent_when_recording_fails() {
    let ctx = TestContext::new();
    let chat_id = 505;

    ctx.send(chat_id, Event::Start).await;
    ctx.press(chat_id, Token::Contact).await;

    ctx.store.set_unavailable(true);
    assert_eq!(ctx.text(chat_id, "Когда начало?").await, vec![Reply::ContactDelivered, Reply::MainMenu]);
    assert_eq!(ctx.state(chat_id).await, State::Idle);
    assert_eq!(ctx.mailer.sent().len(), 1);
}

#[tokio::test]
async fn undelivered_contact_message_waits_for_the_store() {
    let ctx = TestContext::new();
    let chat_id = 506;
    ctx.mailer.set_failing(true);

    ctx.send(chat_id, Event::Start).await;
    ctx.press(chat_id, Token::Contact).await;

    ctx.store.set_unavailable(true);
    assert_eq!(ctx.text(chat_id, "Здравствуйте").await, vec![Reply::TryAgainLater]);
    assert_eq!(ctx.state(chat_id).await, State::ContactMessage);

    ctx.store.set_unavailable(false);
    assert_eq!(ctx.text(chat_id, "Здравствуйте").await, vec![Reply::ContactFailed, Reply::MainMenu]);
    assert_eq!(ctx.store.contact_messages().await.len(), 1);
}

#[tokio::test]
async fn store_outage_keeps_the_conversation_where_it_was() {
    let ctx = TestContext::new();
    let chat_id = 503;
    ctx.seed_competition("Spring Cup", &[Role::Viewer]).await;

    open_registration(&ctx, chat_id, Role::Viewer).await;
    ctx.answer_all(chat_id, &PROFILE_TO_SCHOOL).await;
    ctx.press(chat_id, Token::Certificate(false)).await;
    ctx.answer_all(chat_id, &["ACME", "Engineer"]).await;

    ctx.store.set_unavailable(true);
    assert_eq!(ctx.press(chat_id, Token::Certificate(false)).await, vec![Reply::TryAgainLater]);
    assert_eq!(ctx.state(chat_id).await, State::NewUserCertificateLater);

    ctx.store.set_unavailable(false);
    let replies = ctx.press(chat_id, Token::Certificate(false)).await;
    assert_matches!(replies.as_slice(), [Reply::Confirmation { .. }]);
}

#[tokio::test]
async fn free_text_in_button_states_points_at_the_buttons() {
    let ctx = TestContext::new();
    let chat_id = 504;
    ctx.seed_competition("Spring Cup", &[Role::Viewer]).await;

    ctx.send(chat_id, Event::Start).await;
    assert_eq!(ctx.text(chat_id, "привет").await, vec![Reply::UseMenu]);

    ctx.press(chat_id, Token::Register).await;
    assert_eq!(ctx.text(chat_id, "зритель").await, vec![Reply::UseButtons]);
    assert_eq!(ctx.state(chat_id).await, State::SelectRole);
}
