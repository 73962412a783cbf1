//! Competition repository implementation

use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::store::CompetitionStore;
use crate::models::{Competition, CreateCompetitionRequest, Role};
use crate::utils::errors::RegistrationDeskError;

const COMPETITION_COLUMNS: &str = "id, name, description, entry_open_player, entry_open_voter, \
    entry_open_viewer, entry_open_adviser, created_at";

#[derive(Clone, Debug)]
pub struct CompetitionRepository {
    pool: PgPool,
}

impl CompetitionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompetitionStore for CompetitionRepository {
    async fn create_competition(&self, request: CreateCompetitionRequest) -> Result<Competition, RegistrationDeskError> {
        let sql = format!(
            r#"
            INSERT INTO competitions (name, description, entry_open_player, entry_open_voter,
                                      entry_open_viewer, entry_open_adviser, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            RETURNING {COMPETITION_COLUMNS}
            "#
        );

        let open = |role: Role| request.open_roles.contains(&role);
        let competition = sqlx::query_as::<_, Competition>(&sql)
            .bind(&request.name)
            .bind(&request.description)
            .bind(open(Role::Player))
            .bind(open(Role::Voter))
            .bind(open(Role::Viewer))
            .bind(open(Role::Adviser))
            .fetch_one(&self.pool)
            .await?;

        Ok(competition)
    }

    async fn list_open_competitions(&self) -> Result<Vec<Competition>, RegistrationDeskError> {
        let sql = format!(
            r#"
            SELECT {COMPETITION_COLUMNS} FROM competitions
            WHERE entry_open_player OR entry_open_voter OR entry_open_viewer OR entry_open_adviser
            ORDER BY created_at, id
            "#
        );

        let competitions = sqlx::query_as::<_, Competition>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(competitions)
    }

    async fn find_competition(&self, competition_id: i64) -> Result<Option<Competition>, RegistrationDeskError> {
        let sql = format!("SELECT {COMPETITION_COLUMNS} FROM competitions WHERE id = $1");
        let competition = sqlx::query_as::<_, Competition>(&sql)
            .bind(competition_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(competition)
    }

    async fn add_member(&self, competition_id: i64, user_id: i64, role: Role) -> Result<bool, RegistrationDeskError> {
        let result = sqlx::query(
            r#"
            INSERT INTO competition_members (competition_id, user_id, role, added_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (competition_id, user_id, role) DO NOTHING
            "#,
        )
        .bind(competition_id)
        .bind(user_id)
        .bind(role)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_member(&self, competition_id: i64, user_id: i64, role: Role) -> Result<bool, RegistrationDeskError> {
        let result = sqlx::query(
            "DELETE FROM competition_members WHERE competition_id = $1 AND user_id = $2 AND role = $3",
        )
        .bind(competition_id)
        .bind(user_id)
        .bind(role)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn members(&self, competition_id: i64, role: Role) -> Result<Vec<i64>, RegistrationDeskError> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT user_id FROM competition_members WHERE competition_id = $1 AND role = $2 ORDER BY added_at",
        )
        .bind(competition_id)
        .bind(role)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(user_id,)| user_id).collect())
    }
}
