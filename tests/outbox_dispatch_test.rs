//! Outbox sweeps against scripted delivery outcomes

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::*;
use RegistrationDesk::config::OutboxConfig;
use RegistrationDesk::models::{NewOutboxItem, OutboxItem, OutboxStatus, MAX_ERROR_CHARS};
use RegistrationDesk::services::OutboxDispatcher;
use RegistrationDesk::utils::errors::DeliveryError;
use tokio::sync::watch;
use tokio_test::{assert_err, assert_ok};

fn config() -> OutboxConfig {
    OutboxConfig { poll_seconds: 1, batch_size: 50, max_attempts: 10, sends_per_second: 1000 }
}

async fn enqueue(ctx: &TestContext, chat_id: i64, message: &str) -> OutboxItem {
    ctx.stores()
        .outbox
        .enqueue(NewOutboxItem { user_id: None, chat_id, message: message.to_string() })
        .await
        .unwrap()
}

async fn item(ctx: &TestContext, id: i64) -> OutboxItem {
    ctx.stores().outbox.find_item(id).await.unwrap().unwrap()
}

fn dispatcher(ctx: &TestContext) -> OutboxDispatcher {
    OutboxDispatcher::new(ctx.stores().outbox, ctx.notifier.clone(), &config())
}

#[tokio::test]
async fn successful_delivery_marks_sent() {
    let ctx = TestContext::new();
    let queued = enqueue(&ctx, 42, "Регистрация открыта").await;

    let report = assert_ok!(dispatcher(&ctx).sweep().await);
    assert_eq!((report.sent, report.retried, report.failed), (1, 0, 0));

    let stored = item(&ctx, queued.id).await;
    assert_eq!(stored.status, OutboxStatus::Sent);
    assert!(stored.sent_at.is_some());
    assert_eq!(ctx.notifier.delivered(), vec![(42, "Регистрация открыта".to_string())]);
}

#[tokio::test]
async fn failure_below_threshold_stays_pending() {
    let ctx = TestContext::new();
    let queued = enqueue(&ctx, 42, "hello").await;
    ctx.notifier.push(Err(DeliveryError::Transport("Forbidden: bot was blocked by the user".into())));

    let report = dispatcher(&ctx).sweep().await.unwrap();
    assert_eq!(report.retried, 1);

    let stored = item(&ctx, queued.id).await;
    assert_eq!(stored.status, OutboxStatus::Pending);
    assert_eq!(stored.attempts, 1);
    assert!(stored.last_error.as_deref().unwrap_or_default().contains("blocked"));
}

#[tokio::test]
async fn failure_at_threshold_gives_up() {
    let ctx = TestContext::new();
    let queued = enqueue(&ctx, 42, "hello").await;
    ctx.store.set_attempts(queued.id, 9).await;
    ctx.notifier.push(Err(DeliveryError::Transport("chat not found".into())));

    let report = dispatcher(&ctx).sweep().await.unwrap();
    assert_eq!(report.failed, 1);

    let stored = item(&ctx, queued.id).await;
    assert_eq!(stored.status, OutboxStatus::Failed);
    assert_eq!(stored.attempts, 10);

    // Failed rows are never picked up again
    let report = dispatcher(&ctx).sweep().await.unwrap();
    assert_eq!(report.processed(), 0);
}

#[tokio::test]
async fn rate_limiting_is_retried_past_the_threshold() {
    let ctx = TestContext::new();
    let queued = enqueue(&ctx, 42, "hello").await;
    ctx.store.set_attempts(queued.id, 9).await;
    ctx.notifier.push(Err(DeliveryError::RateLimited { retry_after_secs: 3 }));

    dispatcher(&ctx).sweep().await.unwrap();

    let stored = item(&ctx, queued.id).await;
    assert_eq!(stored.status, OutboxStatus::Pending);
    assert_eq!(stored.attempts, 10);
}

#[tokio::test]
async fn one_bad_item_does_not_stop_the_batch() {
    let ctx = TestContext::new();
    let first = enqueue(&ctx, 1, "first").await;
    let second = enqueue(&ctx, 2, "second").await;
    let third = enqueue(&ctx, 3, "third").await;
    ctx.notifier.push(Ok(()));
    ctx.notifier.push(Err(DeliveryError::Unexpected("timeout".into())));

    let report = dispatcher(&ctx).sweep().await.unwrap();
    assert_eq!((report.sent, report.retried, report.failed), (2, 1, 0));

    assert_eq!(item(&ctx, first.id).await.status, OutboxStatus::Sent);
    assert_eq!(item(&ctx, second.id).await.status, OutboxStatus::Pending);
    assert_eq!(item(&ctx, third.id).await.status, OutboxStatus::Sent);
}

#[tokio::test]
async fn long_errors_are_truncated() {
    let ctx = TestContext::new();
    let queued = enqueue(&ctx, 42, "hello").await;
    ctx.notifier.push(Err(DeliveryError::Transport("x".repeat(MAX_ERROR_CHARS * 2))));

    dispatcher(&ctx).sweep().await.unwrap();

    let stored = item(&ctx, queued.id).await;
    assert_eq!(stored.last_error.unwrap().chars().count(), MAX_ERROR_CHARS);
}

#[tokio::test]
async fn unavailable_store_fails_the_sweep() {
    let ctx = TestContext::new();
    enqueue(&ctx, 42, "hello").await;
    ctx.store.set_unavailable(true);

    assert_err!(dispatcher(&ctx).sweep().await);
    assert!(ctx.notifier.delivered().is_empty());
}

#[tokio::test]
async fn background_loop_delivers_and_stops_on_shutdown() {
    let ctx = TestContext::new();
    let queued = enqueue(&ctx, 42, "hello").await;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = Arc::new(dispatcher(&ctx)).spawn(shutdown_rx);

    // The first tick fires immediately
    let mut delivered = false;
    for _ in 0..50 {
        if item(&ctx, queued.id).await.status == OutboxStatus::Sent {
            delivered = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(delivered);

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
}
