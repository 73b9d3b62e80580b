//! Registration repository
//!
//! Registrations are owned by the event catalog; this repository only
//! reads them back for verification and reconciliation. Writes happen
//! inside the finalization transaction (see `transactions`).

use crate::domain::entities::Registration;
use unifest_common::Result;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All registrations produced for one team
    pub async fn list_for_team(&self, team_id: Uuid) -> Result<Vec<Registration>> {
        let rows = sqlx::query_as::<_, Registration>(
            "SELECT user_id, event_id, team_id, created_at \
             FROM registrations \
             WHERE team_id = $1 \
             ORDER BY created_at ASC",
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// A user's registration for an event, if any
    pub async fn get_for_user(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Registration>> {
        let row = sqlx::query_as::<_, Registration>(
            "SELECT user_id, event_id, team_id, created_at \
             FROM registrations \
             WHERE event_id = $1 AND user_id = $2",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Count registrations carrying a team reference
    pub async fn count_for_team(&self, team_id: Uuid) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM registrations WHERE team_id = $1")
                .bind(team_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
