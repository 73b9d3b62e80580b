//! Domain entities for the Unifest teams domain
//!
//! Teams, memberships, and registrations with their validation rules and
//! the derived counters the membership and finalization flows rely on.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use unifest_common::{Error, Result};

/// Minimum length of a team name after trimming
pub const TEAM_NAME_MIN_CHARS: usize = 3;

/// Maximum length of a team name after trimming
pub const TEAM_NAME_MAX_CHARS: usize = 50;

/// Length of a generated join code
pub const JOIN_CODE_LEN: usize = 6;

const JOIN_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Team lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "team_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TeamStatus {
    #[default]
    Draft,
    Pending,
    Locked,
}

impl TeamStatus {
    /// Locked teams accept no further membership or settings mutation
    pub fn is_locked(&self) -> bool {
        matches!(self, TeamStatus::Locked)
    }

    /// Statuses surfaced in open-team discovery
    pub fn is_discoverable(&self) -> bool {
        matches!(self, TeamStatus::Draft | TeamStatus::Pending)
    }
}

impl std::fmt::Display for TeamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeamStatus::Draft => write!(f, "draft"),
            TeamStatus::Pending => write!(f, "pending"),
            TeamStatus::Locked => write!(f, "locked"),
        }
    }
}

/// Team visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "team_visibility", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TeamVisibility {
    #[default]
    Public,
    Private,
}

impl TeamVisibility {
    pub fn is_private(&self) -> bool {
        matches!(self, TeamVisibility::Private)
    }
}

impl std::fmt::Display for TeamVisibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeamVisibility::Public => write!(f, "public"),
            TeamVisibility::Private => write!(f, "private"),
        }
    }
}

/// Membership roles within a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Captain,
    #[default]
    Member,
}

impl MemberRole {
    /// Captains accept/decline requests, change settings, and finalize
    pub fn is_captain(&self) -> bool {
        matches!(self, MemberRole::Captain)
    }
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemberRole::Captain => write!(f, "captain"),
            MemberRole::Member => write!(f, "member"),
        }
    }
}

/// Membership status on the team-member relation
///
/// `Invited` is written by organizer tooling, never by this core; it still
/// counts as active in the join-by-code capacity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "member_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
    Invited,
}

impl MemberStatus {
    /// Active memberships count toward capacity and block joining other teams
    pub fn is_active(&self) -> bool {
        matches!(self, MemberStatus::Pending | MemberStatus::Accepted)
    }
}

impl std::fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemberStatus::Pending => write!(f, "pending"),
            MemberStatus::Accepted => write!(f, "accepted"),
            MemberStatus::Declined => write!(f, "declined"),
            MemberStatus::Invited => write!(f, "invited"),
        }
    }
}

/// Team entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    pub id: Uuid,
    pub event_id: Uuid,
    pub created_by: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub min_size: i32,
    pub max_size: Option<i32>,
    pub open_to_join: bool,
    pub visibility: TeamVisibility,
    pub join_code: Option<String>,
    pub status: TeamStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Team {
    /// Create a new team in `draft` with validation.
    ///
    /// Private teams are never open to join and always carry a join code.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        event_id: Uuid,
        created_by: Uuid,
        name: String,
        description: Option<String>,
        min_size: Option<i32>,
        max_size: Option<i32>,
        open_to_join: bool,
        visibility: TeamVisibility,
    ) -> Result<Self> {
        let name = Self::validate_name(&name)?;

        let min_size = min_size.unwrap_or(1);
        Self::validate_size_bounds(min_size, max_size)?;

        let (open_to_join, join_code) = if visibility.is_private() {
            (false, Some(Self::generate_join_code()))
        } else {
            (open_to_join, None)
        };

        let now = Utc::now();
        Ok(Team {
            id: Uuid::new_v4(),
            event_id,
            created_by,
            name,
            description,
            min_size,
            max_size,
            open_to_join,
            visibility,
            join_code,
            status: TeamStatus::Draft,
            created_at: now,
            updated_at: now,
        })
    }

    /// Validate and normalize a team name (trimmed, 3-50 characters)
    pub fn validate_name(name: &str) -> Result<String> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(Error::Validation("Team name is required.".to_string()));
        }
        if trimmed.chars().count() < TEAM_NAME_MIN_CHARS {
            return Err(Error::Validation(format!(
                "Team name must be at least {} characters.",
                TEAM_NAME_MIN_CHARS
            )));
        }
        if trimmed.chars().count() > TEAM_NAME_MAX_CHARS {
            return Err(Error::Validation(format!(
                "Team name must be less than {} characters.",
                TEAM_NAME_MAX_CHARS
            )));
        }
        Ok(trimmed.to_string())
    }

    /// Validate min/max size bounds
    pub fn validate_size_bounds(min_size: i32, max_size: Option<i32>) -> Result<()> {
        if min_size < 1 {
            return Err(Error::Validation(
                "Minimum team size must be at least 1.".to_string(),
            ));
        }
        if let Some(max) = max_size {
            if max < min_size {
                return Err(Error::Validation(format!(
                    "Team size cannot be smaller than {}.",
                    min_size
                )));
            }
        }
        Ok(())
    }

    /// Generate a shareable join code (uppercase alphanumeric)
    pub fn generate_join_code() -> String {
        let mut rng = rand::thread_rng();
        (0..JOIN_CODE_LEN)
            .map(|_| {
                let idx = rng.gen_range(0..JOIN_CODE_ALPHABET.len());
                JOIN_CODE_ALPHABET[idx] as char
            })
            .collect()
    }

    pub fn is_locked(&self) -> bool {
        self.status.is_locked()
    }

    /// Validate invariants
    pub fn validate(&self) -> Result<()> {
        Self::validate_name(&self.name)?;
        Self::validate_size_bounds(self.min_size, self.max_size)?;

        // Private teams are closed to open joining and carry a join code
        if self.visibility.is_private() {
            if self.open_to_join {
                return Err(Error::Validation(
                    "Private teams cannot be open to join.".to_string(),
                ));
            }
            if self.join_code.is_none() {
                return Err(Error::Validation(
                    "Private teams must have a join code.".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Membership entity - association between a user and a team
///
/// Keyed by `(team_id, user_id)`; the same user re-requesting a spot
/// upserts this row rather than duplicating it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TeamMember {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub request_note: Option<String>,
    pub joined_at: DateTime<Utc>,
}

impl TeamMember {
    /// The creator's captain membership, accepted from the start
    pub fn captain(team_id: Uuid, user_id: Uuid) -> Self {
        TeamMember {
            team_id,
            user_id,
            role: MemberRole::Captain,
            status: MemberStatus::Accepted,
            request_note: None,
            joined_at: Utc::now(),
        }
    }

    /// A join request awaiting captain approval
    pub fn join_request(team_id: Uuid, user_id: Uuid, note: Option<String>) -> Self {
        TeamMember {
            team_id,
            user_id,
            role: MemberRole::Member,
            status: MemberStatus::Pending,
            request_note: note,
            joined_at: Utc::now(),
        }
    }

    /// A direct join granted by possession of the team's join code
    pub fn code_join(team_id: Uuid, user_id: Uuid) -> Self {
        TeamMember {
            team_id,
            user_id,
            role: MemberRole::Member,
            status: MemberStatus::Accepted,
            request_note: None,
            joined_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Registration row produced by finalization (or a solo registration)
///
/// Unique per `(user_id, event_id)`; finalize upserts with last-write-wins
/// so a prior solo registration is converted to a team registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Registration {
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub team_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Registration {
    pub fn for_team(user_id: Uuid, event_id: Uuid, team_id: Uuid) -> Self {
        Registration {
            user_id,
            event_id,
            team_id: Some(team_id),
            created_at: Utc::now(),
        }
    }
}

/// Membership with the joined display name from the profile store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MemberWithProfile {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub request_note: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub full_name: Option<String>,
}

impl MemberWithProfile {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Team with its nested member list, as assembled by the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamWithMembers {
    pub team: Team,
    pub members: Vec<MemberWithProfile>,
}

impl TeamWithMembers {
    pub fn accepted_count(&self) -> usize {
        self.members
            .iter()
            .filter(|m| m.status == MemberStatus::Accepted)
            .count()
    }

    pub fn pending_count(&self) -> usize {
        self.members
            .iter()
            .filter(|m| m.status == MemberStatus::Pending)
            .count()
    }

    /// Accepted + pending, the capacity measure for open join requests
    pub fn active_count(&self) -> usize {
        self.accepted_count() + self.pending_count()
    }

    /// Accepted + pending + invited, the capacity measure for code joins
    pub fn active_count_with_invited(&self) -> usize {
        self.members
            .iter()
            .filter(|m| {
                m.status.is_active() || m.status == MemberStatus::Invited
            })
            .count()
    }

    /// Whether the user holds any membership row on this team
    pub fn has_member(&self, user_id: Uuid) -> bool {
        self.members.iter().any(|m| m.user_id == user_id)
    }

    /// Guard: the team accepts open join requests
    pub fn ensure_joinable(&self) -> Result<()> {
        if self.team.is_locked() {
            return Err(Error::State("Team has already been locked.".to_string()));
        }
        if !self.team.open_to_join || self.team.visibility.is_private() {
            return Err(Error::State(
                "Team is not accepting new members.".to_string(),
            ));
        }
        Ok(())
    }

    /// Guard: capacity for an open join request (accepted + pending)
    pub fn ensure_capacity_for_request(&self) -> Result<()> {
        if let Some(max) = self.team.max_size {
            if self.active_count() >= max as usize {
                return Err(Error::Capacity(
                    "Team already has the maximum number of members.".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Guard: capacity for a join-by-code (accepted + pending + invited)
    pub fn ensure_capacity_for_code_join(&self) -> Result<()> {
        if let Some(max) = self.team.max_size {
            if self.active_count_with_invited() >= max as usize {
                return Err(Error::Capacity(
                    "Team already has the maximum number of members.".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// A user's membership plus the owning team, scoped to one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipContext {
    pub team_id: Uuid,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub joined_at: DateTime<Utc>,
    pub team: TeamWithMembers,
}
