//! Notification outbox dispatcher
//!
//! Pending rows are swept on a fixed interval, oldest first, and handed to the
//! [`Notifier`] one at a time. Delivery is at-least-once: a send that succeeded
//! but was never acknowledged is retried and may arrive twice.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::notification::Notifier;
use crate::config::OutboxConfig;
use crate::database::OutboxStore;
use crate::models::{OutboxFailure, OutboxItem, OutboxStatus, MAX_ERROR_CHARS};
use crate::utils::errors::{DeliveryError, Result};
use crate::utils::helpers::truncate_chars;
use crate::utils::logging::log_outbox_result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Keep the row pending for the next sweep
    Retry,
    /// Mark the row failed; it is never picked up again
    GiveUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: i32,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts: i32::try_from(max_attempts).unwrap_or(i32::MAX).max(1) }
    }

    /// Decide what happens to a row whose delivery just failed.
    ///
    /// `attempts` counts the attempt that just failed. Rate limiting never
    /// exhausts an item.
    pub fn decide(&self, attempts: i32, error: &DeliveryError) -> RetryDecision {
        match error {
            DeliveryError::RateLimited { .. } => RetryDecision::Retry,
            DeliveryError::Transport(_) | DeliveryError::Unexpected(_) if attempts >= self.max_attempts => {
                RetryDecision::GiveUp
            }
            DeliveryError::Transport(_) | DeliveryError::Unexpected(_) => RetryDecision::Retry,
        }
    }
}

/// Outcome counts for one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub sent: usize,
    pub retried: usize,
    pub failed: usize,
}

impl SweepReport {
    pub fn processed(&self) -> usize {
        self.sent + self.retried + self.failed
    }
}

pub struct OutboxDispatcher {
    outbox: Arc<dyn OutboxStore>,
    notifier: Arc<dyn Notifier>,
    policy: RetryPolicy,
    batch_size: u32,
    poll_interval: Duration,
    limiter: DefaultDirectRateLimiter,
}

impl std::fmt::Debug for OutboxDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboxDispatcher")
            .field("policy", &self.policy)
            .field("batch_size", &self.batch_size)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl OutboxDispatcher {
    pub fn new(outbox: Arc<dyn OutboxStore>, notifier: Arc<dyn Notifier>, config: &OutboxConfig) -> Self {
        let per_second = NonZeroU32::new(config.sends_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            outbox,
            notifier,
            policy: RetryPolicy::new(config.max_attempts),
            batch_size: config.batch_size.max(1),
            poll_interval: config.poll_interval(),
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run one sweep over the oldest pending rows.
    ///
    /// Only a failure to fetch the batch is returned as an error; per-item
    /// failures are logged and counted.
    pub async fn sweep(&self) -> Result<SweepReport> {
        let sweep_id = Uuid::new_v4();
        let items = self.outbox.fetch_pending(self.batch_size).await?;
        if items.is_empty() {
            return Ok(SweepReport::default());
        }

        debug!(%sweep_id, items = items.len(), "Outbox sweep started");
        let mut report = SweepReport::default();

        for item in items {
            self.limiter.until_ready().await;
            match self.deliver(&item).await {
                Ok(DeliveryOutcome::Sent) => report.sent += 1,
                Ok(DeliveryOutcome::Retried) => report.retried += 1,
                Ok(DeliveryOutcome::Failed) => report.failed += 1,
                Err(e) => {
                    // The row stays pending and is picked up again next sweep
                    error!(%sweep_id, item_id = item.id, error = %e, "Failed to record outbox delivery result");
                    report.retried += 1;
                }
            }
        }

        info!(
            %sweep_id,
            sent = report.sent,
            retried = report.retried,
            failed = report.failed,
            "Outbox sweep finished"
        );
        Ok(report)
    }

    async fn deliver(&self, item: &OutboxItem) -> Result<DeliveryOutcome> {
        let attempts = item.attempts + 1;

        let error = match self.notifier.send_text(item.chat_id, &item.message).await {
            Ok(()) => {
                self.outbox.mark_sent(item.id).await?;
                log_outbox_result(item.id, item.chat_id, attempts, "sent", None);
                return Ok(DeliveryOutcome::Sent);
            }
            Err(e) => e,
        };

        let last_error = truncate_chars(&error.to_string(), MAX_ERROR_CHARS);
        let (status, outcome) = match self.policy.decide(attempts, &error) {
            RetryDecision::Retry => (OutboxStatus::Pending, DeliveryOutcome::Retried),
            RetryDecision::GiveUp => (OutboxStatus::Failed, DeliveryOutcome::Failed),
        };

        self.outbox
            .mark_failed(item.id, OutboxFailure { attempts, status, last_error: last_error.clone() })
            .await?;
        log_outbox_result(item.id, item.chat_id, attempts, status.as_str(), Some(&last_error));

        Ok(outcome)
    }

    /// Sweep every poll interval until `shutdown` flips to `true`
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        info!(
            poll_seconds = self.poll_interval.as_secs(),
            batch_size = self.batch_size,
            max_attempts = self.policy.max_attempts,
            "Outbox dispatcher started"
        );

        let mut ticker = interval(self.poll_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep().await {
                        warn!(error = %e, "Outbox sweep failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Outbox dispatcher stopped");
    }

    pub fn spawn(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeliveryOutcome {
    Sent,
    Retried,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limiting_never_gives_up() {
        let policy = RetryPolicy::new(3);
        let err = DeliveryError::RateLimited { retry_after_secs: 1 };
        assert_eq!(policy.decide(1, &err), RetryDecision::Retry);
        assert_eq!(policy.decide(50, &err), RetryDecision::Retry);
    }

    #[test]
    fn transport_failures_give_up_at_max_attempts() {
        let policy = RetryPolicy::new(10);
        let err = DeliveryError::Transport("blocked".into());
        assert_eq!(policy.decide(9, &err), RetryDecision::Retry);
        assert_eq!(policy.decide(10, &err), RetryDecision::GiveUp);

        let unexpected = DeliveryError::Unexpected("boom".into());
        assert_eq!(policy.decide(10, &unexpected), RetryDecision::GiveUp);
    }

    #[test]
    fn zero_max_attempts_is_clamped() {
        assert_eq!(RetryPolicy::new(0).max_attempts, 1);
    }

    #[test]
    fn report_counts_everything_processed() {
        let report = SweepReport { sent: 2, retried: 1, failed: 3 };
        assert_eq!(report.processed(), 6);
    }
}
