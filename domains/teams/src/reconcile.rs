//! Reconciliation sweep for partially-applied multi-step writes
//!
//! Current writes are transactional, but rows created by earlier tooling
//! (or written around this core) can still exhibit two orphan shapes:
//! a team with no captain membership, and a locked team that produced no
//! registrations. The sweep detects both and reports them; it never
//! mutates.

use sqlx::PgPool;
use uuid::Uuid;

use unifest_common::{Error, Result};

/// Findings from one sweep
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    /// Teams with no captain membership row
    pub orphaned_teams: Vec<Uuid>,
    /// Locked teams with zero registrations
    pub orphaned_locks: Vec<Uuid>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.orphaned_teams.is_empty() && self.orphaned_locks.is_empty()
    }

    /// One `PartialFailure` per finding, for callers that surface sweep
    /// results through the normal error channel.
    pub fn into_failures(self) -> Vec<Error> {
        let mut failures = Vec::with_capacity(self.orphaned_teams.len() + self.orphaned_locks.len());
        for team_id in self.orphaned_teams {
            failures.push(Error::PartialFailure(format!(
                "team {} has no captain membership",
                team_id
            )));
        }
        for team_id in self.orphaned_locks {
            failures.push(Error::PartialFailure(format!(
                "locked team {} produced no registrations",
                team_id
            )));
        }
        failures
    }
}

#[derive(Clone)]
pub struct ReconciliationSweep {
    pool: PgPool,
}

impl ReconciliationSweep {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run one detection pass over all teams.
    pub async fn run(&self) -> Result<SweepReport> {
        let orphaned_teams: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT t.id FROM teams t \
             WHERE NOT EXISTS ( \
                 SELECT 1 FROM team_members m \
                 WHERE m.team_id = t.id AND m.role = 'captain' \
             ) \
             ORDER BY t.created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let orphaned_locks: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT t.id FROM teams t \
             WHERE t.status = 'locked' \
               AND NOT EXISTS ( \
                   SELECT 1 FROM registrations r WHERE r.team_id = t.id \
               ) \
             ORDER BY t.created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let report = SweepReport {
            orphaned_teams: orphaned_teams.into_iter().map(|(id,)| id).collect(),
            orphaned_locks: orphaned_locks.into_iter().map(|(id,)| id).collect(),
        };

        for team_id in &report.orphaned_teams {
            tracing::warn!(team_id = %team_id, "orphaned team: no captain membership");
        }
        for team_id in &report.orphaned_locks {
            tracing::warn!(team_id = %team_id, "orphaned lock: no registrations");
        }

        Ok(report)
    }
}
