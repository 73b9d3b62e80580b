//! Repository implementations for the teams domain
//!
//! The persistence gateway: explicitly constructed around one `PgPool`
//! and injected into the services. Query results are assembled into
//! domain DTOs (`TeamWithMembers`, `MembershipContext`) so the storage
//! shape never leaks upward.

pub mod memberships;
pub mod registrations;
pub mod teams;
pub mod transactions;

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::entities::MembershipContext;
use unifest_common::Result;

pub use memberships::{MembershipRepository, MembershipRow};
pub use registrations::RegistrationRepository;
pub use teams::TeamRepository;
pub use transactions::{
    create_membership_tx, create_team_tx, list_accepted_member_ids_tx, lock_team_tx,
    upsert_registration_tx,
};

/// Combined repository access for the teams domain
#[derive(Clone)]
pub struct TeamsRepositories {
    pool: PgPool,
    pub teams: TeamRepository,
    pub memberships: MembershipRepository,
    pub registrations: RegistrationRepository,
}

impl TeamsRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            teams: TeamRepository::new(pool.clone()),
            memberships: MembershipRepository::new(pool.clone()),
            registrations: RegistrationRepository::new(pool.clone()),
            pool,
        }
    }

    /// Begin a new database transaction.
    pub async fn begin(&self) -> std::result::Result<Transaction<'static, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }

    /// The user's memberships in an event, each with its team assembled.
    ///
    /// Ordered by team creation time so the first entry is the stable
    /// "my team" for the session.
    pub async fn membership_context(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<MembershipContext>> {
        let rows = self
            .memberships
            .list_for_user_in_event(event_id, user_id)
            .await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let team_ids: Vec<Uuid> = rows.iter().map(|r| r.team_id).collect();
        let teams = self.teams.list_by_ids(&team_ids).await?;

        let contexts = rows
            .into_iter()
            .filter_map(|row| {
                teams
                    .iter()
                    .find(|t| t.team.id == row.team_id)
                    .cloned()
                    .map(|team| MembershipContext {
                        team_id: row.team_id,
                        role: row.role,
                        status: row.status,
                        joined_at: row.joined_at,
                        team,
                    })
            })
            .collect();

        Ok(contexts)
    }
}
