//! Teams domain: team formation, membership, and event registration
//!
//! The team-formation core of Unifest: a registry for team CRUD, a
//! membership manager for the join/accept/decline protocol, a
//! finalization engine that converts accepted rosters into event
//! registrations, and a per-(event, user) session facade on top.

pub mod domain;
pub mod manager;
pub mod provider;
pub mod reconcile;
pub mod repository;
pub mod service;

// Re-export domain types at the crate root for convenience
pub use domain::entities::*;
pub use domain::policy::TeamSizePolicy;
pub use domain::state::{
    MemberEvent, MemberStateMachine, StateError, TeamEvent, TeamStateMachine,
};

// Re-export repository types
pub use repository::{
    create_membership_tx, create_team_tx, list_accepted_member_ids_tx, lock_team_tx,
    upsert_registration_tx, MembershipRepository, MembershipRow, RegistrationRepository,
    TeamRepository, TeamsRepositories,
};

// Re-export services and the session facade
pub use manager::{MutationOutcome, TeamManager, TeamSnapshot};
pub use provider::{EventProvider, EventSummary, PgEventProvider, PgProfileStore, Profile, ProfileStore};
pub use reconcile::{ReconciliationSweep, SweepReport};
pub use service::{
    check_roster_bounds, CreateTeamInput, FinalizationEngine, MembershipManager, TeamRegistry,
    TeamSettingsPatch,
};
