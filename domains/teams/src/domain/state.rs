//! State machines for teams domain entities
//!
//! Each state machine defines the valid states, the events that trigger
//! transitions, and the terminal states. `Locked` teams and decided
//! memberships never transition again.

use thiserror::Error;

use crate::domain::entities::{MemberStatus, TeamStatus};

/// Errors that can occur during state transitions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    #[error("Invalid transition: cannot transition from {from} to {to} via {event}")]
    InvalidTransition {
        from: String,
        to: String,
        event: String,
    },

    #[error("Terminal state: {0} is a terminal state and cannot transition")]
    TerminalState(String),
}

// ============================================================================
// Team State Machine
// ============================================================================

impl TeamStatus {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Locked)
    }

    /// Get all valid next states from current state
    pub fn valid_transitions(&self) -> &'static [TeamStatus] {
        match self {
            Self::Draft => &[Self::Pending, Self::Locked],
            Self::Pending => &[Self::Locked],
            Self::Locked => &[],
        }
    }
}

/// Events that trigger team state transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TeamEvent {
    /// Captain submits the roster for review (organizer tooling path)
    Submit,
    /// Captain finalizes the roster, locking the team
    Finalize,
}

impl std::fmt::Display for TeamEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submit => write!(f, "submit"),
            Self::Finalize => write!(f, "finalize"),
        }
    }
}

/// Team state machine
pub struct TeamStateMachine;

impl TeamStateMachine {
    /// Attempt a state transition
    ///
    /// Returns the new state if the transition is valid, or an error otherwise.
    pub fn transition(current: TeamStatus, event: TeamEvent) -> Result<TeamStatus, StateError> {
        // Locked is terminal; nothing mutates a locked team
        if current.is_terminal() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        let next = match (&current, &event) {
            (TeamStatus::Draft, TeamEvent::Submit) => TeamStatus::Pending,
            (TeamStatus::Draft, TeamEvent::Finalize) => TeamStatus::Locked,
            (TeamStatus::Pending, TeamEvent::Finalize) => TeamStatus::Locked,

            // Invalid transitions
            _ => {
                return Err(StateError::InvalidTransition {
                    from: current.to_string(),
                    to: "unknown".to_string(),
                    event: event.to_string(),
                });
            }
        };

        Ok(next)
    }

    /// Check if a transition is valid without performing it
    pub fn can_transition(current: TeamStatus, event: TeamEvent) -> bool {
        Self::transition(current, event).is_ok()
    }
}

// ============================================================================
// Membership State Machine
// ============================================================================

impl MemberStatus {
    /// Decided memberships stay decided; only deletion resets them
    pub fn is_decided(&self) -> bool {
        matches!(self, Self::Accepted | Self::Declined)
    }

    /// Get all valid next states from current state
    pub fn valid_transitions(&self) -> &'static [MemberStatus] {
        match self {
            Self::Pending => &[Self::Accepted, Self::Declined],
            Self::Invited => &[Self::Accepted, Self::Declined],
            Self::Accepted => &[],
            Self::Declined => &[],
        }
    }
}

/// Events that trigger membership state transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MemberEvent {
    /// Captain accepts the request (or invitee accepts the invite)
    Accept,
    /// Captain declines the request (or invitee declines the invite)
    Decline,
}

impl std::fmt::Display for MemberEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accept => write!(f, "accept"),
            Self::Decline => write!(f, "decline"),
        }
    }
}

/// Membership state machine
pub struct MemberStateMachine;

impl MemberStateMachine {
    /// Attempt a state transition
    pub fn transition(current: MemberStatus, event: MemberEvent) -> Result<MemberStatus, StateError> {
        if current.is_decided() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        let next = match (&current, &event) {
            (MemberStatus::Pending, MemberEvent::Accept) => MemberStatus::Accepted,
            (MemberStatus::Pending, MemberEvent::Decline) => MemberStatus::Declined,
            (MemberStatus::Invited, MemberEvent::Accept) => MemberStatus::Accepted,
            (MemberStatus::Invited, MemberEvent::Decline) => MemberStatus::Declined,

            // All non-decided states are covered above
            _ => {
                return Err(StateError::InvalidTransition {
                    from: current.to_string(),
                    to: "unknown".to_string(),
                    event: event.to_string(),
                });
            }
        };

        Ok(next)
    }

    /// Map a decided status back to the event that produces it
    pub fn event_for_target(target: MemberStatus) -> Option<MemberEvent> {
        match target {
            MemberStatus::Accepted => Some(MemberEvent::Accept),
            MemberStatus::Declined => Some(MemberEvent::Decline),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
