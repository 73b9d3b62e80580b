//! Team registry: team CRUD with business rule enforcement

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::domain::entities::{Team, TeamMember, TeamStatus, TeamVisibility, TeamWithMembers};
use crate::domain::state::{TeamEvent, TeamStateMachine};
use crate::repository::{create_membership_tx, create_team_tx, TeamsRepositories};
use unifest_common::{Error, Result};

/// Request for creating a new team
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTeamInput {
    /// Team display name (3-50 chars)
    #[validate(length(min = 3, max = 50))]
    pub name: String,

    pub description: Option<String>,

    /// Defaults to the event policy's minimum (or 1) when absent
    #[validate(range(min = 1))]
    pub min_size: Option<i32>,

    #[validate(range(min = 1))]
    pub max_size: Option<i32>,

    pub open_to_join: bool,

    pub visibility: TeamVisibility,
}

/// Partial update of a team's settings.
///
/// `None` leaves a field unchanged; the double-`Option` fields distinguish
/// "unchanged" from "cleared".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamSettingsPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub min_size: Option<i32>,
    pub max_size: Option<Option<i32>>,
    pub open_to_join: Option<bool>,
    pub visibility: Option<TeamVisibility>,
    pub status: Option<TeamStatus>,
}

#[derive(Clone)]
pub struct TeamRegistry {
    repos: TeamsRepositories,
}

impl TeamRegistry {
    pub fn new(repos: TeamsRepositories) -> Self {
        Self { repos }
    }

    /// Create a team in `draft` and install its creator as an accepted
    /// captain. Both inserts run in one transaction.
    pub async fn create_team(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        input: CreateTeamInput,
    ) -> Result<Team> {
        input
            .validate()
            .map_err(|e| Error::Validation(format!("Validation failed: {}", e)))?;

        let mut team = Team::new(
            event_id,
            user_id,
            input.name,
            input.description,
            input.min_size,
            input.max_size,
            input.open_to_join,
            input.visibility,
        )?;

        // Join codes are a shared secret; collisions would leak another
        // team's roster to the wrong holder
        if team.join_code.is_some() {
            team.join_code = Some(self.unique_join_code().await?);
        }

        let mut tx = self
            .repos
            .begin()
            .await
            .map_err(|e| Error::Internal(format!("Failed to begin transaction: {}", e)))?;

        let created = create_team_tx(&mut tx, &team)
            .await
            .map_err(|e| Error::Internal(format!("Failed to create team: {}", e)))?;

        let captain = TeamMember::captain(created.id, user_id);
        create_membership_tx(&mut tx, &captain)
            .await
            .map_err(|e| Error::Internal(format!("Failed to create captain membership: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| Error::Internal(format!("Failed to commit transaction: {}", e)))?;

        tracing::info!(team_id = %created.id, event_id = %event_id, "team created");
        Ok(created)
    }

    /// All teams for an event with nested member lists, creation order
    /// ascending
    pub async fn teams_for_event(&self, event_id: Uuid) -> Result<Vec<TeamWithMembers>> {
        self.repos.teams.list_by_event(event_id).await
    }

    /// Joinable teams surfaced in discovery (open, not locked)
    pub async fn open_teams(&self, event_id: Uuid) -> Result<Vec<TeamWithMembers>> {
        self.repos.teams.list_open_by_event(event_id).await
    }

    /// Apply a partial settings update. Locked teams reject every change.
    pub async fn update_settings(&self, team_id: Uuid, patch: TeamSettingsPatch) -> Result<Team> {
        let mut team = self
            .repos
            .teams
            .get_by_id(team_id)
            .await?
            .ok_or_else(|| Error::NotFound("Team not found.".to_string()))?;

        if team.is_locked() {
            return Err(Error::State("Team has already been locked.".to_string()));
        }

        if let Some(name) = patch.name {
            team.name = Team::validate_name(&name)?;
        }
        if let Some(description) = patch.description {
            team.description = description;
        }
        if let Some(min_size) = patch.min_size {
            team.min_size = min_size;
        }
        if let Some(max_size) = patch.max_size {
            team.max_size = max_size;
        }
        Team::validate_size_bounds(team.min_size, team.max_size)?;

        if let Some(open) = patch.open_to_join {
            team.open_to_join = open;
        }
        if let Some(visibility) = patch.visibility {
            team.visibility = visibility;
        }
        match team.visibility {
            TeamVisibility::Private => {
                team.open_to_join = false;
                if team.join_code.is_none() {
                    team.join_code = Some(self.unique_join_code().await?);
                }
            }
            TeamVisibility::Public => {
                team.join_code = None;
            }
        }

        if let Some(status) = patch.status {
            team.status = Self::apply_status_patch(team.status, status)?;
        }

        team.validate()?;
        let updated = self.repos.teams.update(&team).await?;

        tracing::info!(team_id = %updated.id, "team settings updated");
        Ok(updated)
    }

    /// Status changes via settings go through the state machine; only the
    /// submit transition is reachable here (finalize owns locking).
    fn apply_status_patch(current: TeamStatus, target: TeamStatus) -> Result<TeamStatus> {
        if current == target {
            return Ok(current);
        }
        match target {
            TeamStatus::Pending => TeamStateMachine::transition(current, TeamEvent::Submit)
                .map_err(|e| Error::State(e.to_string())),
            TeamStatus::Locked => Err(Error::State(
                "Teams are locked through finalization, not settings.".to_string(),
            )),
            TeamStatus::Draft => Err(Error::State(
                "A submitted team cannot return to draft.".to_string(),
            )),
        }
    }

    /// Draw join codes until one is unused.
    async fn unique_join_code(&self) -> Result<String> {
        // 36^6 codes; a handful of draws is plenty even on a busy event
        for _ in 0..5 {
            let code = Team::generate_join_code();
            if self
                .repos
                .teams
                .get_by_join_code_with_members(&code)
                .await?
                .is_none()
            {
                return Ok(code);
            }
        }
        Err(Error::Internal(
            "Failed to allocate a unique join code".to_string(),
        ))
    }
}
