//! Contact message repository implementation

use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::store::ContactStore;
use crate::models::{ContactMessage, NewContactMessage};
use crate::utils::errors::RegistrationDeskError;

#[derive(Clone, Debug)]
pub struct ContactRepository {
    pool: PgPool,
}

impl ContactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactStore for ContactRepository {
    async fn record_contact_message(&self, message: NewContactMessage) -> Result<ContactMessage, RegistrationDeskError> {
        let record = sqlx::query_as::<_, ContactMessage>(
            r#"
            INSERT INTO contact_messages (chat_id, username, body, delivered, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING id, chat_id, username, body, delivered, created_at
            "#,
        )
        .bind(message.chat_id)
        .bind(message.username)
        .bind(message.body)
        .bind(message.delivered)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }
}
