//! Services module
//!
//! This module contains the services that sit between the stores and the
//! outer surfaces (chat, admin API, background dispatcher)

pub mod broadcast;
pub mod email;
pub mod notification;
pub mod outbox;
pub mod review;

// Re-export commonly used services
pub use broadcast::{BroadcastService, Channel, NotifyReport, NotifyRequest};
pub use email::{mailer_from_config, LogMailer, Mailer, SmtpMailer};
pub use notification::{classify_request_error, Notifier, TelegramNotifier};
pub use outbox::{OutboxDispatcher, RetryDecision, RetryPolicy, SweepReport};
pub use review::ReviewService;

use std::sync::Arc;

use crate::config::OutboxConfig;
use crate::database::Stores;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub review: ReviewService,
    pub broadcast: BroadcastService,
    pub mailer: Arc<dyn Mailer>,
    pub notifier: Arc<dyn Notifier>,
    stores: Stores,
}

impl std::fmt::Debug for ServiceFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceFactory")
            .field("review", &self.review)
            .field("broadcast", &self.broadcast)
            .finish_non_exhaustive()
    }
}

impl ServiceFactory {
    pub fn new(stores: Stores, mailer: Arc<dyn Mailer>, notifier: Arc<dyn Notifier>) -> Self {
        let review = ReviewService::new(stores.registrations.clone());
        let broadcast = BroadcastService::new(stores.profiles.clone(), stores.outbox.clone(), mailer.clone());

        Self { review, broadcast, mailer, notifier, stores }
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn outbox_dispatcher(&self, config: &OutboxConfig) -> Arc<OutboxDispatcher> {
        Arc::new(OutboxDispatcher::new(self.stores.outbox.clone(), self.notifier.clone(), config))
    }

    /// Health check for the persistence backend
    pub async fn health_check(&self) -> ServiceHealthStatus {
        // Cheapest read every backend supports
        let database_healthy = self.stores.competitions.list_open_competitions().await.is_ok();
        ServiceHealthStatus { database_healthy }
    }
}

/// Health status for all services
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ServiceHealthStatus {
    pub database_healthy: bool,
}

impl ServiceHealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.database_healthy
    }

    /// Get list of unhealthy services
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if !self.database_healthy {
            issues.push("Database unavailable".to_string());
        }
        issues
    }
}
