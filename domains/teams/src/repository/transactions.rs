//! Transactional free functions for the teams domain (Zero2Prod pattern)
//!
//! Multi-statement sequences (create team + captain membership; lock +
//! read roster + write registrations) run through these inside a single
//! `Transaction` so a mid-sequence failure rolls back cleanly.

use crate::domain::entities::{Registration, Team, TeamMember};
use unifest_common::RepositoryError;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

/// Insert a team within an existing transaction.
pub async fn create_team_tx(
    transaction: &mut Transaction<'_, Postgres>,
    team: &Team,
) -> std::result::Result<Team, sqlx::Error> {
    let created = sqlx::query_as::<_, Team>(
        "INSERT INTO teams (id, event_id, created_by, name, description, min_size, max_size, \
                            open_to_join, visibility, join_code, status, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
         RETURNING id, event_id, created_by, name, description, min_size, max_size, \
                   open_to_join, visibility, join_code, status, created_at, updated_at",
    )
    .bind(team.id)
    .bind(team.event_id)
    .bind(team.created_by)
    .bind(&team.name)
    .bind(&team.description)
    .bind(team.min_size)
    .bind(team.max_size)
    .bind(team.open_to_join)
    .bind(team.visibility)
    .bind(&team.join_code)
    .bind(team.status)
    .bind(team.created_at)
    .bind(team.updated_at)
    .fetch_one(&mut **transaction)
    .await?;

    Ok(created)
}

/// Insert a membership within an existing transaction.
pub async fn create_membership_tx(
    transaction: &mut Transaction<'_, Postgres>,
    member: &TeamMember,
) -> std::result::Result<TeamMember, sqlx::Error> {
    let created = sqlx::query_as::<_, TeamMember>(
        "INSERT INTO team_members (team_id, user_id, role, status, request_note, joined_at) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING team_id, user_id, role, status, request_note, joined_at",
    )
    .bind(member.team_id)
    .bind(member.user_id)
    .bind(member.role)
    .bind(member.status)
    .bind(&member.request_note)
    .bind(member.joined_at)
    .fetch_one(&mut **transaction)
    .await?;

    Ok(created)
}

/// Lock a team and close it to new joins within an existing transaction.
///
/// Returns `RepositoryError::NotFound` if the team does not exist.
pub async fn lock_team_tx(
    transaction: &mut Transaction<'_, Postgres>,
    team_id: Uuid,
) -> std::result::Result<(), RepositoryError> {
    let result = sqlx::query(
        "UPDATE teams \
         SET status = 'locked', open_to_join = FALSE, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(team_id)
    .execute(&mut **transaction)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

/// Read the accepted roster within an existing transaction.
pub async fn list_accepted_member_ids_tx(
    transaction: &mut Transaction<'_, Postgres>,
    team_id: Uuid,
) -> std::result::Result<Vec<Uuid>, sqlx::Error> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        "SELECT user_id FROM team_members \
         WHERE team_id = $1 AND status = 'accepted' \
         ORDER BY joined_at ASC",
    )
    .bind(team_id)
    .fetch_all(&mut **transaction)
    .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Upsert one registration within an existing transaction.
///
/// Keyed by `(user_id, event_id)`, last write wins: a prior solo
/// registration is converted to the team registration.
pub async fn upsert_registration_tx(
    transaction: &mut Transaction<'_, Postgres>,
    registration: &Registration,
) -> std::result::Result<Registration, sqlx::Error> {
    let row = sqlx::query_as::<_, Registration>(
        "INSERT INTO registrations (user_id, event_id, team_id, created_at) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (user_id, event_id) DO UPDATE SET team_id = EXCLUDED.team_id \
         RETURNING user_id, event_id, team_id, created_at",
    )
    .bind(registration.user_id)
    .bind(registration.event_id)
    .bind(registration.team_id)
    .bind(registration.created_at)
    .fetch_one(&mut **transaction)
    .await?;

    Ok(row)
}
