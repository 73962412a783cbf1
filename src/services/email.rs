//! Outbound email
//!
//! Used by the "contact the team" flow and by email broadcasts. With no SMTP
//! host configured, [`LogMailer`] writes messages to the log instead.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, error, info, warn};

use crate::config::EmailConfig;
use crate::utils::errors::{RegistrationDeskError, Result};

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, recipients: &[String], subject: &str, body: &str) -> Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let builder = if config.smtp_secure {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
        };

        let builder = builder.port(config.smtp_port);
        let builder = match (&config.smtp_user, &config.smtp_password) {
            (Some(user), Some(password)) => builder.credentials(Credentials::new(user.clone(), password.clone())),
            _ => builder,
        };

        let from: Mailbox = config.from_address.parse()?;
        info!(host = %config.smtp_host, port = config.smtp_port, "SMTP mailer configured");

        Ok(Self { transport: builder.build(), from })
    }
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer").field("from", &self.from.to_string()).finish_non_exhaustive()
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, recipients: &[String], subject: &str, body: &str) -> Result<()> {
        if recipients.is_empty() {
            return Err(RegistrationDeskError::Email("no recipients".to_string()));
        }

        let mut builder = Message::builder().from(self.from.clone()).subject(subject);
        for recipient in recipients {
            builder = builder.to(recipient.parse()?);
        }
        let message = builder.header(ContentType::TEXT_PLAIN).body(body.to_string())?;

        self.transport.send(message).await.map_err(|e| {
            error!(error = %e, subject, "SMTP delivery failed");
            RegistrationDeskError::from(e)
        })?;

        debug!(recipients = recipients.len(), subject, "Email sent");
        Ok(())
    }
}

/// Writes outgoing mail to the log; used when SMTP is not configured.
///
/// Nothing leaves the process, so every send reports a failure and callers
/// treat the mail as undelivered.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, recipients: &[String], subject: &str, body: &str) -> Result<()> {
        info!(?recipients, subject, body_chars = body.chars().count(), "SMTP disabled, email logged only");
        Err(RegistrationDeskError::Email("SMTP is not configured".to_string()))
    }
}

/// SMTP when a host is configured, otherwise the logging mailer
pub fn mailer_from_config(config: &EmailConfig) -> Result<Arc<dyn Mailer>> {
    if config.smtp_enabled() {
        Ok(Arc::new(SmtpMailer::new(config)?))
    } else {
        warn!("SMTP host not configured, outgoing email will only be logged and reported as undelivered");
        Ok(Arc::new(LogMailer))
    }
}
