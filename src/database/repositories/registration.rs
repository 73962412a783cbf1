//! Registration request repository implementation

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};

use crate::database::store::RegistrationStore;
use crate::models::{MembershipChange, NewRegistrationRequest, RegistrationRequest, RequestStatus};
use crate::utils::errors::RegistrationDeskError;

const REQUEST_COLUMNS: &str = "id, user_id, competition_id, role, status, user_first_name, user_last_name, \
    user_email, user_phone, created_at, reviewed_at, reviewed_by, rejection_reason";

#[derive(Clone, Debug)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lock_request(
        tx: &mut Transaction<'_, Postgres>,
        request_id: i64,
    ) -> Result<RegistrationRequest, RegistrationDeskError> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM registration_requests WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, RegistrationRequest>(&sql)
            .bind(request_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or(RegistrationDeskError::RegistrationRequestNotFound { request_id })
    }

    /// Persist the reviewed request and its membership effect, then commit
    async fn finish_review(
        mut tx: Transaction<'_, Postgres>,
        request: &RegistrationRequest,
        change: MembershipChange,
    ) -> Result<(), RegistrationDeskError> {
        sqlx::query(
            r#"
            UPDATE registration_requests
            SET status = $2, reviewed_at = $3, reviewed_by = $4, rejection_reason = $5
            WHERE id = $1
            "#,
        )
        .bind(request.id)
        .bind(request.status)
        .bind(request.reviewed_at)
        .bind(request.reviewed_by)
        .bind(&request.rejection_reason)
        .execute(&mut *tx)
        .await?;

        match change {
            MembershipChange::Add => {
                sqlx::query(
                    r#"
                    INSERT INTO competition_members (competition_id, user_id, role, added_at)
                    VALUES ($1, $2, $3, NOW())
                    ON CONFLICT (competition_id, user_id, role) DO NOTHING
                    "#,
                )
                .bind(request.competition_id)
                .bind(request.user_id)
                .bind(request.role)
                .execute(&mut *tx)
                .await?;
            }
            MembershipChange::Remove => {
                sqlx::query(
                    "DELETE FROM competition_members WHERE competition_id = $1 AND user_id = $2 AND role = $3",
                )
                .bind(request.competition_id)
                .bind(request.user_id)
                .bind(request.role)
                .execute(&mut *tx)
                .await?;
            }
            MembershipChange::Unchanged => {}
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl RegistrationStore for RegistrationRepository {
    async fn get_or_create_request(
        &self,
        request: NewRegistrationRequest,
    ) -> Result<(RegistrationRequest, bool), RegistrationDeskError> {
        let insert = format!(
            r#"
            INSERT INTO registration_requests (user_id, competition_id, role, status, user_first_name,
                                               user_last_name, user_email, user_phone, created_at)
            VALUES ($1, $2, $3, 'pending', $4, $5, $6, $7, NOW())
            ON CONFLICT (user_id, competition_id, role) DO NOTHING
            RETURNING {REQUEST_COLUMNS}
            "#
        );

        let created = sqlx::query_as::<_, RegistrationRequest>(&insert)
            .bind(request.user_id)
            .bind(request.competition_id)
            .bind(request.role)
            .bind(&request.user_first_name)
            .bind(&request.user_last_name)
            .bind(&request.user_email)
            .bind(&request.user_phone)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(created) = created {
            return Ok((created, true));
        }

        let select = format!(
            "SELECT {REQUEST_COLUMNS} FROM registration_requests WHERE user_id = $1 AND competition_id = $2 AND role = $3"
        );
        let existing = sqlx::query_as::<_, RegistrationRequest>(&select)
            .bind(request.user_id)
            .bind(request.competition_id)
            .bind(request.role)
            .fetch_one(&self.pool)
            .await?;

        Ok((existing, false))
    }

    async fn find_request(&self, request_id: i64) -> Result<Option<RegistrationRequest>, RegistrationDeskError> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM registration_requests WHERE id = $1");
        let request = sqlx::query_as::<_, RegistrationRequest>(&sql)
            .bind(request_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(request)
    }

    async fn list_requests(
        &self,
        status: Option<RequestStatus>,
    ) -> Result<Vec<RegistrationRequest>, RegistrationDeskError> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM registration_requests WHERE ($1::TEXT IS NULL OR status = $1) ORDER BY created_at DESC"
        );
        let requests = sqlx::query_as::<_, RegistrationRequest>(&sql)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;

        Ok(requests)
    }

    async fn approve_request(
        &self,
        request_id: i64,
        reviewer: Option<i64>,
    ) -> Result<RegistrationRequest, RegistrationDeskError> {
        let mut tx = self.pool.begin().await?;
        let mut request = Self::lock_request(&mut tx, request_id).await?;

        let change = request.approve(reviewer, Utc::now())?;
        Self::finish_review(tx, &request, change).await?;

        Ok(request)
    }

    async fn reject_request(
        &self,
        request_id: i64,
        reviewer: Option<i64>,
        reason: Option<String>,
    ) -> Result<RegistrationRequest, RegistrationDeskError> {
        let mut tx = self.pool.begin().await?;
        let mut request = Self::lock_request(&mut tx, request_id).await?;

        let change = request.reject(reviewer, reason, Utc::now())?;
        Self::finish_review(tx, &request, change).await?;

        Ok(request)
    }
}
