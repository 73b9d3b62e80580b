//! Per-(event, user) team session facade
//!
//! Presentation layers hold one `TeamManager` per event screen. Every
//! mutation runs through the same wrapper: mark mutating, perform the
//! operation, refresh the snapshot unconditionally (success or failure,
//! so the caller never observes stale state), clear mutating, and hand
//! back the outcome.

use uuid::Uuid;

use crate::domain::entities::{
    MemberStatus, MembershipContext, Registration, Team, TeamMember, TeamWithMembers,
};
use crate::domain::policy::TeamSizePolicy;
use crate::repository::TeamsRepositories;
use crate::service::{
    check_roster_bounds, CreateTeamInput, FinalizationEngine, MembershipManager, TeamRegistry,
    TeamSettingsPatch,
};
use unifest_common::{Error, Result};

/// Result of one facade mutation: whichever of data and error applies.
///
/// The refresh that follows the operation reports its own failures
/// through the snapshot's `error` field, not here.
#[derive(Debug)]
pub struct MutationOutcome<T> {
    pub data: Option<T>,
    pub error: Option<Error>,
}

impl<T> MutationOutcome<T> {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl<T> From<Result<T>> for MutationOutcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => MutationOutcome {
                data: Some(data),
                error: None,
            },
            Err(error) => MutationOutcome {
                data: None,
                error: Some(error),
            },
        }
    }
}

/// Consolidated view of team state for one (event, user) session
#[derive(Debug, Default)]
pub struct TeamSnapshot {
    pub teams: Vec<TeamWithMembers>,
    pub open_teams: Vec<TeamWithMembers>,
    pub membership: Option<MembershipContext>,
    pub loading: bool,
    pub mutating: bool,
    pub error: Option<Error>,
}

/// Orchestrates registry, membership, and finalization operations for a
/// single (event, user) context and keeps a post-mutation snapshot.
pub struct TeamManager {
    event_id: Uuid,
    user_id: Uuid,
    policy: TeamSizePolicy,
    repos: TeamsRepositories,
    registry: TeamRegistry,
    memberships: MembershipManager,
    finalizer: FinalizationEngine,
    state: TeamSnapshot,
}

impl TeamManager {
    pub fn new(
        repos: TeamsRepositories,
        event_id: Uuid,
        user_id: Uuid,
        policy: TeamSizePolicy,
    ) -> Self {
        Self {
            event_id,
            user_id,
            policy,
            registry: TeamRegistry::new(repos.clone()),
            memberships: MembershipManager::new(repos.clone()),
            finalizer: FinalizationEngine::new(repos.clone()),
            repos,
            state: TeamSnapshot::default(),
        }
    }

    /// The current consolidated snapshot
    pub fn snapshot(&self) -> &TeamSnapshot {
        &self.state
    }

    /// The user's team for this event: first membership in the registry's
    /// stable creation order. Derived, never stored separately.
    pub fn my_team(&self) -> Option<&TeamWithMembers> {
        self.state.membership.as_ref().map(|m| &m.team)
    }

    /// Re-fetch teams, open teams, and the user's membership context
    /// concurrently. Partial failures keep whichever results succeeded;
    /// the first error is recorded on the snapshot.
    pub async fn refresh(&mut self) {
        if !self.policy.is_team_event {
            self.state.teams.clear();
            self.state.open_teams.clear();
            self.state.membership = None;
            self.state.loading = false;
            self.state.error = None;
            return;
        }

        self.state.loading = true;
        self.state.error = None;

        let (teams_result, open_result, context_result) = tokio::join!(
            self.registry.teams_for_event(self.event_id),
            self.registry.open_teams(self.event_id),
            self.repos.membership_context(self.event_id, self.user_id),
        );

        let mut first_error: Option<Error> = None;
        let mut record = |e: Error| {
            tracing::warn!(error = %e, "refresh fetch failed");
            if first_error.is_none() {
                first_error = Some(e);
            }
        };

        match teams_result {
            Ok(teams) => self.state.teams = teams,
            Err(e) => record(e),
        }
        match open_result {
            Ok(open) => self.state.open_teams = open,
            Err(e) => record(e),
        }
        match context_result {
            Ok(contexts) => self.state.membership = contexts.into_iter().next(),
            Err(e) => record(e),
        }

        self.state.error = first_error;
        self.state.loading = false;
    }

    /// Create a team, seeding unset size bounds from the event policy.
    pub async fn create_team(&mut self, mut input: CreateTeamInput) -> MutationOutcome<Team> {
        if let Err(e) = self.begin_mutation() {
            return MutationOutcome::from(Err(e));
        }
        if input.min_size.is_none() {
            input.min_size = Some(self.policy.min_size);
        }
        if input.max_size.is_none() {
            input.max_size = self.policy.max_size;
        }
        let result = self
            .registry
            .create_team(self.event_id, self.user_id, input)
            .await;
        self.finish_mutation().await;
        MutationOutcome::from(result)
    }

    pub async fn join_team(
        &mut self,
        team_id: Uuid,
        note: Option<String>,
    ) -> MutationOutcome<TeamMember> {
        if let Err(e) = self.begin_mutation() {
            return MutationOutcome::from(Err(e));
        }
        let result = self.memberships.join_team(team_id, self.user_id, note).await;
        self.finish_mutation().await;
        MutationOutcome::from(result)
    }

    pub async fn join_team_by_code(
        &mut self,
        join_code: &str,
    ) -> MutationOutcome<TeamWithMembers> {
        if let Err(e) = self.begin_mutation() {
            return MutationOutcome::from(Err(e));
        }
        let result = self
            .memberships
            .join_team_by_code(join_code, self.user_id)
            .await;
        self.finish_mutation().await;
        MutationOutcome::from(result)
    }

    /// Leave a team. The facade blocks this for locked teams; the
    /// membership manager itself would not.
    pub async fn leave_team(&mut self, team_id: Uuid) -> MutationOutcome<()> {
        if let Err(e) = self.begin_mutation() {
            return MutationOutcome::from(Err(e));
        }
        let result = self.leave_unlocked_team(team_id).await;
        self.finish_mutation().await;
        MutationOutcome::from(result)
    }

    /// Captain decision on a pending member
    pub async fn update_member(
        &mut self,
        team_id: Uuid,
        member_user_id: Uuid,
        status: MemberStatus,
    ) -> MutationOutcome<()> {
        if let Err(e) = self.begin_mutation() {
            return MutationOutcome::from(Err(e));
        }
        let result = self
            .memberships
            .update_member_status(team_id, member_user_id, status)
            .await;
        self.finish_mutation().await;
        MutationOutcome::from(result)
    }

    /// Finalize the roster. The facade enforces the min/max roster bounds
    /// before invoking the engine; the engine itself only rejects an empty
    /// accepted set.
    pub async fn finalize_team(&mut self, team_id: Uuid) -> MutationOutcome<Vec<Registration>> {
        if let Err(e) = self.begin_mutation() {
            return MutationOutcome::from(Err(e));
        }
        let result = self.finalize_with_bounds(team_id).await;
        self.finish_mutation().await;
        MutationOutcome::from(result)
    }

    pub async fn cancel_join_request(&mut self, team_id: Uuid) -> MutationOutcome<()> {
        if let Err(e) = self.begin_mutation() {
            return MutationOutcome::from(Err(e));
        }
        let result = self
            .memberships
            .cancel_join_request(team_id, self.user_id)
            .await;
        self.finish_mutation().await;
        MutationOutcome::from(result)
    }

    pub async fn update_team_settings(
        &mut self,
        team_id: Uuid,
        patch: TeamSettingsPatch,
    ) -> MutationOutcome<Team> {
        if let Err(e) = self.begin_mutation() {
            return MutationOutcome::from(Err(e));
        }
        let result = self.registry.update_settings(team_id, patch).await;
        self.finish_mutation().await;
        MutationOutcome::from(result)
    }

    async fn leave_unlocked_team(&self, team_id: Uuid) -> Result<()> {
        let team = self
            .repos
            .teams
            .get_by_id(team_id)
            .await?
            .ok_or_else(|| Error::NotFound("Team not found.".to_string()))?;
        if team.is_locked() {
            return Err(Error::State("Team has already been locked.".to_string()));
        }
        self.memberships.leave_team(team_id, self.user_id).await
    }

    async fn finalize_with_bounds(&self, team_id: Uuid) -> Result<Vec<Registration>> {
        let team = self
            .repos
            .teams
            .get_with_members(team_id)
            .await?
            .ok_or_else(|| Error::NotFound("Team not found.".to_string()))?;
        check_roster_bounds(&team.team, team.accepted_count())?;
        self.finalizer.finalize_team(team_id, self.event_id).await
    }

    /// Mutations on a solo event have nothing to act on
    fn begin_mutation(&mut self) -> Result<()> {
        if !self.policy.is_team_event {
            return Err(Error::State(
                "This event does not take team registrations.".to_string(),
            ));
        }
        self.state.mutating = true;
        Ok(())
    }

    async fn finish_mutation(&mut self) {
        self.refresh().await;
        self.state.mutating = false;
    }
}
