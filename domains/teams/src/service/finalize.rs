//! Finalization engine: lock a team and convert its accepted roster
//! into event registrations
//!
//! The whole sequence (lock, read roster, upsert registrations) runs in
//! one transaction; the lock write still happens first so the statement
//! order matches what the rest of the system expects to observe.

use uuid::Uuid;

use crate::domain::entities::{Registration, Team};
use crate::repository::{
    list_accepted_member_ids_tx, lock_team_tx, upsert_registration_tx, TeamsRepositories,
};
use unifest_common::{Error, Result};

/// Roster bounds check the caller runs before invoking the engine.
///
/// The engine itself only refuses an empty roster; min/max enforcement is
/// the session facade's business rule.
pub fn check_roster_bounds(team: &Team, accepted_count: usize) -> Result<()> {
    if accepted_count < team.min_size as usize {
        return Err(Error::Validation(format!(
            "You need at least {} accepted members before finalising.",
            team.min_size
        )));
    }
    if let Some(max) = team.max_size {
        if accepted_count > max as usize {
            return Err(Error::Validation(format!(
                "Reduce your team to {} accepted members before finalising.",
                max
            )));
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct FinalizationEngine {
    repos: TeamsRepositories,
}

impl FinalizationEngine {
    pub fn new(repos: TeamsRepositories) -> Self {
        Self { repos }
    }

    /// Lock the team and upsert one registration per accepted member.
    ///
    /// Registrations are keyed `(user_id, event_id)` with last-write-wins,
    /// so a member's prior solo registration becomes the team registration.
    /// On any failure the transaction rolls back and the team stays
    /// unlocked.
    pub async fn finalize_team(&self, team_id: Uuid, event_id: Uuid) -> Result<Vec<Registration>> {
        let mut tx = self
            .repos
            .begin()
            .await
            .map_err(|e| Error::Internal(format!("Failed to begin transaction: {}", e)))?;

        lock_team_tx(&mut tx, team_id).await?;

        let member_ids = list_accepted_member_ids_tx(&mut tx, team_id)
            .await
            .map_err(|e| Error::Internal(format!("Failed to read accepted members: {}", e)))?;

        if member_ids.is_empty() {
            // Drop of `tx` rolls the lock back
            return Err(Error::Validation(
                "No accepted members found for this team.".to_string(),
            ));
        }

        let mut registrations = Vec::with_capacity(member_ids.len());
        for user_id in member_ids {
            let registration = upsert_registration_tx(
                &mut tx,
                &Registration::for_team(user_id, event_id, team_id),
            )
            .await
            .map_err(|e| Error::Internal(format!("Failed to write registration: {}", e)))?;
            registrations.push(registration);
        }

        tx.commit()
            .await
            .map_err(|e| Error::Internal(format!("Failed to commit transaction: {}", e)))?;

        tracing::info!(
            team_id = %team_id,
            event_id = %event_id,
            registrations = registrations.len(),
            "team finalized"
        );
        Ok(registrations)
    }
}
