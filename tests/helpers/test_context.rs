//! In-memory application context for integration tests
//!
//! Wires the conversation engine and the services over one [`MemoryStore`],
//! so a test can drive a chat and then inspect exactly what was persisted.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use RegistrationDesk::database::{MemoryStore, Stores};
use RegistrationDesk::models::{Competition, CreateCompetitionRequest, ProfileDraft, Role, TelegramIdentity, UpsertProfileRequest, User};
use RegistrationDesk::services::ServiceFactory;
use RegistrationDesk::state::{
    ContactSettings, ConversationEngine, ConversationMachine, Event, MemorySessionStore, Reply, State, Token,
};

use super::doubles::{RecordingMailer, ScriptedNotifier};

pub const CONTACT_RECIPIENT: &str = "team@example.com";

/// Fixed clock for birth-date checks
pub fn test_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 10).unwrap()
}

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
    pub notifier: Arc<ScriptedNotifier>,
    pub engine: ConversationEngine,
    pub services: ServiceFactory,
}

impl TestContext {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let mailer = Arc::new(RecordingMailer::default());
        let notifier = Arc::new(ScriptedNotifier::default());

        let contact = ContactSettings {
            recipients: vec![CONTACT_RECIPIENT.to_string()],
            subject: "USN contact message".to_string(),
        };
        let machine = ConversationMachine::new(store.stores(), mailer.clone(), contact).with_today(test_today);
        let engine = ConversationEngine::new(
            machine,
            Arc::new(MemorySessionStore::new()),
            Duration::from_secs(24 * 60 * 60),
        );
        let services = ServiceFactory::new(store.stores(), mailer.clone(), notifier.clone());

        Self { store, mailer, notifier, engine, services }
    }

    pub fn stores(&self) -> Stores {
        self.store.stores()
    }

    pub fn identity(chat_id: i64) -> TelegramIdentity {
        TelegramIdentity {
            chat_id,
            telegram_id: Some(chat_id),
            username: Some(format!("user{chat_id}")),
            first_name: Some("Test".to_string()),
            last_name: None,
        }
    }

    pub async fn send(&self, chat_id: i64, event: Event) -> Vec<Reply> {
        self.engine.handle(&Self::identity(chat_id), Some("ru"), event).await
    }

    pub async fn text(&self, chat_id: i64, text: &str) -> Vec<Reply> {
        self.send(chat_id, Event::Text(text.to_string())).await
    }

    pub async fn press(&self, chat_id: i64, token: Token) -> Vec<Reply> {
        self.send(chat_id, Event::Button(token)).await
    }

    /// Answer a run of text prompts, returning the replies to the last one
    pub async fn answer_all(&self, chat_id: i64, answers: &[&str]) -> Vec<Reply> {
        let mut last = Vec::new();
        for answer in answers {
            last = self.text(chat_id, answer).await;
        }
        last
    }

    pub async fn state(&self, chat_id: i64) -> State {
        self.engine
            .session(chat_id)
            .await
            .unwrap()
            .map(|session| session.state)
            .unwrap_or_default()
    }

    pub async fn seed_competition(&self, name: &str, open_roles: &[Role]) -> Competition {
        self.stores()
            .competitions
            .create_competition(CreateCompetitionRequest {
                name: name.to_string(),
                description: None,
                open_roles: open_roles.to_vec(),
            })
            .await
            .unwrap()
    }

    /// A profile that already went through the new-user chain
    pub async fn seed_profile(&self, chat_id: i64, role: Role) -> User {
        self.stores()
            .profiles
            .upsert_profile(UpsertProfileRequest {
                chat_id,
                telegram_id: Some(chat_id),
                username: Some(format!("user{chat_id}")),
                role: Some(role),
                draft: ProfileDraft {
                    first_name: Some("Анна".to_string()),
                    last_name: Some("Смирнова".to_string()),
                    phone: Some("+7 900 000-00-01".to_string()),
                    email: Some(format!("user{chat_id}@example.com")),
                    country: Some("Россия".to_string()),
                    city: Some("Казань".to_string()),
                    school: Some("USN".to_string()),
                    ..ProfileDraft::default()
                },
            })
            .await
            .unwrap()
    }
}
