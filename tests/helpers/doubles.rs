//! Recording stand-ins for the outbound transports

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use RegistrationDesk::services::{Mailer, Notifier};
use RegistrationDesk::utils::errors::{DeliveryError, RegistrationDeskError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Mailer that keeps every message; can be switched into a failing mode
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, recipients: &[String], subject: &str, body: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RegistrationDeskError::Email("smtp connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(SentMail {
            recipients: recipients.to_vec(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Notifier that answers from a script, then succeeds
#[derive(Debug, Default)]
pub struct ScriptedNotifier {
    script: Mutex<VecDeque<std::result::Result<(), DeliveryError>>>,
    delivered: Mutex<Vec<(i64, String)>>,
}

impl ScriptedNotifier {
    pub fn push(&self, outcome: std::result::Result<(), DeliveryError>) {
        self.script.lock().unwrap().push_back(outcome);
    }

    pub fn delivered(&self) -> Vec<(i64, String)> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for ScriptedNotifier {
    async fn send_text(&self, chat_id: i64, text: &str) -> std::result::Result<(), DeliveryError> {
        let outcome = self.script.lock().unwrap().pop_front().unwrap_or(Ok(()));
        if outcome.is_ok() {
            self.delivered.lock().unwrap().push((chat_id, text.to_string()));
        }
        outcome
    }
}
