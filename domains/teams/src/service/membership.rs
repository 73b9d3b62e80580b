//! Membership manager: join/leave/accept/decline/cancel on the
//! team-member relation
//!
//! Capacity checks here are read-then-write with no compare-and-swap;
//! two racing joins can both pass the read. Accepted risk for a
//! low-contention campus-scale deployment (the upsert itself is a single
//! statement).

use uuid::Uuid;

use crate::domain::entities::{MemberStatus, TeamMember, TeamWithMembers};
use crate::domain::state::MemberStateMachine;
use crate::repository::TeamsRepositories;
use unifest_common::{Error, Result};

#[derive(Clone)]
pub struct MembershipManager {
    repos: TeamsRepositories,
}

impl MembershipManager {
    pub fn new(repos: TeamsRepositories) -> Self {
        Self { repos }
    }

    /// Request to join an open public team. Upserts a `pending` row keyed
    /// by `(team_id, user_id)`, so a repeat request re-submits rather than
    /// duplicating.
    pub async fn join_team(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        note: Option<String>,
    ) -> Result<TeamMember> {
        let team = self
            .repos
            .teams
            .get_with_members(team_id)
            .await?
            .ok_or_else(|| Error::NotFound("Team not found.".to_string()))?;

        team.ensure_joinable()?;
        self.ensure_no_other_active_membership(&team, user_id).await?;
        team.ensure_capacity_for_request()?;

        let member = self
            .repos
            .memberships
            .upsert(&TeamMember::join_request(team_id, user_id, note))
            .await?;

        tracing::info!(team_id = %team_id, user_id = %user_id, "join request submitted");
        Ok(member)
    }

    /// Join a private team directly by its code. Possession of the code
    /// stands in for captain approval: the membership lands `accepted`.
    pub async fn join_team_by_code(
        &self,
        join_code: &str,
        user_id: Uuid,
    ) -> Result<TeamWithMembers> {
        let team = match self.repos.teams.get_by_join_code_with_members(join_code).await? {
            Some(team) if team.team.visibility.is_private() => team,
            _ => {
                return Err(Error::NotFound(
                    "No private team found for that code.".to_string(),
                ))
            }
        };

        if team.team.is_locked() {
            return Err(Error::State(
                "This team has already been locked.".to_string(),
            ));
        }

        if team.has_member(user_id) {
            return Err(Error::Conflict(
                "You are already part of this team.".to_string(),
            ));
        }
        self.ensure_no_other_active_membership(&team, user_id).await?;

        team.ensure_capacity_for_code_join()?;

        self.repos
            .memberships
            .upsert(&TeamMember::code_join(team.team.id, user_id))
            .await?;

        tracing::info!(team_id = %team.team.id, user_id = %user_id, "joined team by code");
        Ok(team)
    }

    /// Captain decision on a request: `pending` (or `invited`) to
    /// `accepted` or `declined`. Authorization is the caller's context;
    /// it is not re-validated here.
    pub async fn update_member_status(
        &self,
        team_id: Uuid,
        member_user_id: Uuid,
        status: MemberStatus,
    ) -> Result<()> {
        let team = self
            .repos
            .teams
            .get_by_id(team_id)
            .await?
            .ok_or_else(|| Error::NotFound("Team not found.".to_string()))?;

        // Memberships are immutable once the owning team is locked
        if team.is_locked() {
            return Err(Error::State("Team has already been locked.".to_string()));
        }

        let membership = self
            .repos
            .memberships
            .get_by_team_and_user(team_id, member_user_id)
            .await?
            .ok_or_else(|| Error::NotFound("No join request from this user.".to_string()))?;

        let event = MemberStateMachine::event_for_target(status).ok_or_else(|| {
            Error::Validation(
                "Member status can only be set to accepted or declined.".to_string(),
            )
        })?;
        MemberStateMachine::transition(membership.status, event)
            .map_err(|e| Error::State(e.to_string()))?;

        self.repos
            .memberships
            .update_status(team_id, member_user_id, status)
            .await?;

        tracing::info!(
            team_id = %team_id,
            member = %member_user_id,
            status = %status,
            "membership decided"
        );
        Ok(())
    }

    /// Withdraw the caller's own pending request. Idempotent: a second
    /// call finds nothing to delete and still succeeds.
    pub async fn cancel_join_request(&self, team_id: Uuid, user_id: Uuid) -> Result<()> {
        let removed = self
            .repos
            .memberships
            .delete_pending(team_id, user_id)
            .await?;
        if removed == 0 {
            tracing::debug!(team_id = %team_id, user_id = %user_id, "no pending request to cancel");
        }
        Ok(())
    }

    /// Delete the caller's membership row regardless of status.
    ///
    /// Lock state is deliberately not re-checked here so a member always
    /// has an emergency exit; the session facade blocks leave on locked
    /// teams for the normal path.
    pub async fn leave_team(&self, team_id: Uuid, user_id: Uuid) -> Result<()> {
        self.repos.memberships.delete(team_id, user_id).await?;
        tracing::info!(team_id = %team_id, user_id = %user_id, "left team");
        Ok(())
    }

    /// A user holds at most one active membership per event across all of
    /// that event's teams; a row on the target team itself is fine (the
    /// join is an upsert).
    async fn ensure_no_other_active_membership(
        &self,
        team: &TeamWithMembers,
        user_id: Uuid,
    ) -> Result<()> {
        let existing = self
            .repos
            .memberships
            .find_active_in_event(team.team.event_id, user_id, Some(team.team.id))
            .await?;

        if existing.is_some() {
            return Err(Error::Conflict(
                "You already have an active team for this event.".to_string(),
            ));
        }
        Ok(())
    }
}
