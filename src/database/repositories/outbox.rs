//! Notification outbox repository implementation

use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::store::OutboxStore;
use crate::models::{NewOutboxItem, OutboxFailure, OutboxItem, MAX_ERROR_CHARS};
use crate::utils::errors::RegistrationDeskError;
use crate::utils::helpers::truncate_chars;

const OUTBOX_COLUMNS: &str = "id, user_id, chat_id, message, status, attempts, last_error, created_at, sent_at";

#[derive(Clone, Debug)]
pub struct OutboxRepository {
    pool: PgPool,
}

impl OutboxRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutboxStore for OutboxRepository {
    async fn enqueue(&self, item: NewOutboxItem) -> Result<OutboxItem, RegistrationDeskError> {
        let sql = format!(
            r#"
            INSERT INTO notification_outbox (user_id, chat_id, message, status, attempts, created_at)
            VALUES ($1, $2, $3, 'pending', 0, NOW())
            RETURNING {OUTBOX_COLUMNS}
            "#
        );

        let created = sqlx::query_as::<_, OutboxItem>(&sql)
            .bind(item.user_id)
            .bind(item.chat_id)
            .bind(item.message)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn fetch_pending(&self, limit: u32) -> Result<Vec<OutboxItem>, RegistrationDeskError> {
        let sql = format!(
            "SELECT {OUTBOX_COLUMNS} FROM notification_outbox WHERE status = 'pending' ORDER BY created_at, id LIMIT $1"
        );
        let items = sqlx::query_as::<_, OutboxItem>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    async fn mark_sent(&self, item_id: i64) -> Result<bool, RegistrationDeskError> {
        let result = sqlx::query(
            r#"
            UPDATE notification_outbox
            SET status = 'sent', sent_at = NOW(), last_error = NULL
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(item_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_failed(&self, item_id: i64, failure: OutboxFailure) -> Result<bool, RegistrationDeskError> {
        let result = sqlx::query(
            r#"
            UPDATE notification_outbox
            SET status = $2, attempts = $3, last_error = $4
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(item_id)
        .bind(failure.status)
        .bind(failure.attempts)
        .bind(truncate_chars(&failure.last_error, MAX_ERROR_CHARS))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_item(&self, item_id: i64) -> Result<Option<OutboxItem>, RegistrationDeskError> {
        let sql = format!("SELECT {OUTBOX_COLUMNS} FROM notification_outbox WHERE id = $1");
        let item = sqlx::query_as::<_, OutboxItem>(&sql)
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }
}
