//! User profile repository implementation

use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::store::ProfileStore;
use crate::models::{NewProfileChange, ProfileColumn, Role, TelegramIdentity, UpsertProfileRequest, User};
use crate::utils::errors::RegistrationDeskError;

const USER_COLUMNS: &str = "id, chat_id, telegram_id, username, first_name, last_name, email, phone, role, \
    classic_rating, quick_rating, team_rating, about, birth_date, channel_name, certificate_name, \
    country, city, school, company, position, important_info, created_at, updated_at";

#[derive(Clone, Debug)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for UserRepository {
    async fn get_or_create_by_chat(&self, identity: &TelegramIdentity) -> Result<User, RegistrationDeskError> {
        // Existing profiles only refresh the Telegram handle; names stay as the user entered them.
        let sql = format!(
            r#"
            INSERT INTO users (chat_id, telegram_id, username, first_name, last_name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            ON CONFLICT (chat_id) DO UPDATE
            SET telegram_id = COALESCE(EXCLUDED.telegram_id, users.telegram_id),
                username = COALESCE(EXCLUDED.username, users.username),
                updated_at = NOW()
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(identity.chat_id)
            .bind(identity.telegram_id)
            .bind(&identity.username)
            .bind(&identity.first_name)
            .bind(&identity.last_name)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>, RegistrationDeskError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>, RegistrationDeskError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE telegram_id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(telegram_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn upsert_profile(&self, request: UpsertProfileRequest) -> Result<User, RegistrationDeskError> {
        let draft = request.draft;
        let sql = format!(
            r#"
            INSERT INTO users (
                chat_id, telegram_id, username, role, first_name, last_name, phone, email,
                birth_date, channel_name, country, city, school, company, position,
                certificate_name, important_info, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, NOW(), NOW())
            ON CONFLICT (chat_id) DO UPDATE
            SET telegram_id = COALESCE(EXCLUDED.telegram_id, users.telegram_id),
                username = COALESCE(EXCLUDED.username, users.username),
                role = COALESCE(EXCLUDED.role, users.role),
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                phone = EXCLUDED.phone,
                email = EXCLUDED.email,
                birth_date = EXCLUDED.birth_date,
                channel_name = EXCLUDED.channel_name,
                country = EXCLUDED.country,
                city = EXCLUDED.city,
                school = EXCLUDED.school,
                company = EXCLUDED.company,
                position = EXCLUDED.position,
                certificate_name = EXCLUDED.certificate_name,
                important_info = EXCLUDED.important_info,
                updated_at = NOW()
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(request.chat_id)
            .bind(request.telegram_id)
            .bind(request.username)
            .bind(request.role)
            .bind(draft.first_name)
            .bind(draft.last_name)
            .bind(draft.phone)
            .bind(draft.email)
            .bind(draft.birth_date)
            .bind(draft.channel_name)
            .bind(draft.country)
            .bind(draft.city)
            .bind(draft.school)
            .bind(draft.company)
            .bind(draft.position)
            .bind(draft.certificate_name)
            .bind(draft.important_info)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    async fn update_column(
        &self,
        user_id: i64,
        column: ProfileColumn,
        value: Option<String>,
    ) -> Result<User, RegistrationDeskError> {
        let sql = format!(
            "UPDATE users SET {} = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}",
            column.as_str()
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RegistrationDeskError::UserNotFound { user_id })
    }

    async fn log_change(&self, change: NewProfileChange) -> Result<(), RegistrationDeskError> {
        sqlx::query(
            r#"
            INSERT INTO profile_change_logs (user_id, field_name, old_value, new_value, changed_at)
            VALUES ($1, $2, $3, $4, NOW())
            "#,
        )
        .bind(change.user_id)
        .bind(change.field_name)
        .bind(change.old_value)
        .bind(change.new_value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, RegistrationDeskError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE ($1::TEXT IS NULL OR role = $1) ORDER BY id");
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(role)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }
}
