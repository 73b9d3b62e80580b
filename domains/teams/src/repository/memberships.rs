//! Membership repository

use crate::domain::entities::{MemberRole, MemberStatus, TeamMember};
use chrono::{DateTime, Utc};
use unifest_common::Result;
use sqlx::PgPool;
use uuid::Uuid;

const MEMBER_COLUMNS: &str = "team_id, user_id, role, status, request_note, joined_at";

/// A membership row joined with its team's event, for per-event lookups
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MembershipRow {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub request_note: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub event_id: Uuid,
}

#[derive(Clone)]
pub struct MembershipRepository {
    pool: PgPool,
}

impl MembershipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get membership by team and user
    pub async fn get_by_team_and_user(
        &self,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<TeamMember>> {
        let row = sqlx::query_as::<_, TeamMember>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM team_members WHERE team_id = $1 AND user_id = $2"
        ))
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Upsert a membership keyed by `(team_id, user_id)`.
    ///
    /// A re-request overwrites status and note on the existing row rather
    /// than duplicating it; role and original join time are preserved.
    pub async fn upsert(&self, member: &TeamMember) -> Result<TeamMember> {
        let row = sqlx::query_as::<_, TeamMember>(&format!(
            "INSERT INTO team_members (team_id, user_id, role, status, request_note, joined_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (team_id, user_id) \
             DO UPDATE SET status = EXCLUDED.status, request_note = EXCLUDED.request_note \
             RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(member.team_id)
        .bind(member.user_id)
        .bind(member.role)
        .bind(member.status)
        .bind(&member.request_note)
        .bind(member.joined_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Set a member's status (captain decision)
    pub async fn update_status(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        status: MemberStatus,
    ) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE team_members SET status = $3 WHERE team_id = $1 AND user_id = $2",
        )
        .bind(team_id)
        .bind(user_id)
        .bind(status)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Delete the caller's pending request only. Safe to repeat.
    pub async fn delete_pending(&self, team_id: Uuid, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM team_members \
             WHERE team_id = $1 AND user_id = $2 AND status = 'pending'",
        )
        .bind(team_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Delete a membership row regardless of status
    pub async fn delete(&self, team_id: Uuid, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM team_members WHERE team_id = $1 AND user_id = $2")
            .bind(team_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// The user's membership rows across an event's teams, team creation
    /// order ascending
    pub async fn list_for_user_in_event(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<MembershipRow>> {
        let rows = sqlx::query_as::<_, MembershipRow>(
            "SELECT m.team_id, m.user_id, m.role, m.status, m.request_note, m.joined_at, \
                    t.event_id \
             FROM team_members m \
             INNER JOIN teams t ON t.id = m.team_id \
             WHERE m.user_id = $1 AND t.event_id = $2 \
             ORDER BY t.created_at ASC",
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// The user's active (pending or accepted) membership in an event, if
    /// any, optionally ignoring one team (re-requests on the same team are
    /// an upsert, not a conflict).
    pub async fn find_active_in_event(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        exclude_team: Option<Uuid>,
    ) -> Result<Option<MembershipRow>> {
        let row = sqlx::query_as::<_, MembershipRow>(
            "SELECT m.team_id, m.user_id, m.role, m.status, m.request_note, m.joined_at, \
                    t.event_id \
             FROM team_members m \
             INNER JOIN teams t ON t.id = m.team_id \
             WHERE m.user_id = $1 AND t.event_id = $2 \
               AND m.status IN ('pending', 'accepted') \
               AND ($3::uuid IS NULL OR m.team_id <> $3) \
             ORDER BY t.created_at ASC \
             LIMIT 1",
        )
        .bind(user_id)
        .bind(event_id)
        .bind(exclude_team)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
