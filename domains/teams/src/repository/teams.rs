//! Team repository

use crate::domain::entities::{MemberWithProfile, Team, TeamWithMembers};
use unifest_common::Result;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

const TEAM_COLUMNS: &str = "id, event_id, created_by, name, description, min_size, max_size, \
                            open_to_join, visibility, join_code, status, created_at, updated_at";

#[derive(Clone)]
pub struct TeamRepository {
    pool: PgPool,
}

impl TeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find team by ID
    pub async fn get_by_id(&self, team_id: Uuid) -> Result<Option<Team>> {
        let row = sqlx::query_as::<_, Team>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1"
        ))
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Find team by ID with its nested member list
    pub async fn get_with_members(&self, team_id: Uuid) -> Result<Option<TeamWithMembers>> {
        match self.get_by_id(team_id).await? {
            Some(team) => {
                let mut assembled = self.attach_members(vec![team]).await?;
                Ok(assembled.pop())
            }
            None => Ok(None),
        }
    }

    /// Resolve a team by its join code, with members
    pub async fn get_by_join_code_with_members(
        &self,
        join_code: &str,
    ) -> Result<Option<TeamWithMembers>> {
        let row = sqlx::query_as::<_, Team>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE join_code = $1"
        ))
        .bind(join_code)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(team) => {
                let mut assembled = self.attach_members(vec![team]).await?;
                Ok(assembled.pop())
            }
            None => Ok(None),
        }
    }

    /// All teams for an event, creation order ascending.
    ///
    /// Stable ordering keeps "my team" resolution deterministic when a user
    /// matches several historical teams (first created wins).
    pub async fn list_by_event(&self, event_id: Uuid) -> Result<Vec<TeamWithMembers>> {
        let teams = sqlx::query_as::<_, Team>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE event_id = $1 ORDER BY created_at ASC"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        self.attach_members(teams).await
    }

    /// Open teams for discovery: accepting joins and not yet locked
    pub async fn list_open_by_event(&self, event_id: Uuid) -> Result<Vec<TeamWithMembers>> {
        let teams = sqlx::query_as::<_, Team>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams \
             WHERE event_id = $1 AND open_to_join = TRUE AND status IN ('draft', 'pending') \
             ORDER BY created_at ASC"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        self.attach_members(teams).await
    }

    /// Specific teams by ID with members, creation order ascending
    pub async fn list_by_ids(&self, team_ids: &[Uuid]) -> Result<Vec<TeamWithMembers>> {
        if team_ids.is_empty() {
            return Ok(Vec::new());
        }

        let teams = sqlx::query_as::<_, Team>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE id = ANY($1) ORDER BY created_at ASC"
        ))
        .bind(team_ids)
        .fetch_all(&self.pool)
        .await?;

        self.attach_members(teams).await
    }

    /// Update an existing team's mutable fields
    pub async fn update(&self, team: &Team) -> Result<Team> {
        let updated = sqlx::query_as::<_, Team>(&format!(
            "UPDATE teams \
             SET name = $2, description = $3, min_size = $4, max_size = $5, \
                 open_to_join = $6, visibility = $7, join_code = $8, status = $9, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {TEAM_COLUMNS}"
        ))
        .bind(team.id)
        .bind(&team.name)
        .bind(&team.description)
        .bind(team.min_size)
        .bind(team.max_size)
        .bind(team.open_to_join)
        .bind(team.visibility)
        .bind(&team.join_code)
        .bind(team.status)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    /// Attach member lists (with profile display names) to a batch of teams.
    ///
    /// One `IN` query for the whole batch; teams keep their incoming order.
    async fn attach_members(&self, teams: Vec<Team>) -> Result<Vec<TeamWithMembers>> {
        if teams.is_empty() {
            return Ok(Vec::new());
        }

        let team_ids: Vec<Uuid> = teams.iter().map(|t| t.id).collect();
        let members = sqlx::query_as::<_, MemberWithProfile>(
            "SELECT m.team_id, m.user_id, m.role, m.status, m.request_note, m.joined_at, \
                    p.full_name \
             FROM team_members m \
             LEFT JOIN profiles p ON p.id = m.user_id \
             WHERE m.team_id = ANY($1) \
             ORDER BY m.joined_at ASC",
        )
        .bind(&team_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_team: HashMap<Uuid, Vec<MemberWithProfile>> = HashMap::new();
        for member in members {
            by_team.entry(member.team_id).or_default().push(member);
        }

        Ok(teams
            .into_iter()
            .map(|team| {
                let members = by_team.remove(&team.id).unwrap_or_default();
                TeamWithMembers { team, members }
            })
            .collect())
    }
}
