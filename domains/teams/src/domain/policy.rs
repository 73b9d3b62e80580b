//! Team-size policy derived from event metadata
//!
//! Event details arrive as loosely-shaped JSON from the event catalog.
//! A policy is derived rather than trusted: an event counts as a team
//! event when the flag is declared OR when either size bound exceeds 1.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Team-size policy for one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSizePolicy {
    pub is_team_event: bool,
    pub min_size: i32,
    pub max_size: Option<i32>,
    pub description: Option<String>,
}

impl Default for TeamSizePolicy {
    fn default() -> Self {
        TeamSizePolicy {
            is_team_event: false,
            min_size: 1,
            max_size: None,
            description: None,
        }
    }
}

impl TeamSizePolicy {
    /// Derive the policy from an event's `details` JSON.
    ///
    /// Accepts both camelCase and snake_case keys, and both a nested
    /// `team` object and flat `team*` keys, since the catalog carries
    /// entries written by different organizer tools.
    pub fn from_details(details: &Value) -> Self {
        let team = details.get("team").cloned().unwrap_or(Value::Null);

        let min_size = read_int(&team, &["minSize", "min_size"])
            .or_else(|| read_int(details, &["teamMinSize", "team_min_size"]))
            .unwrap_or(1);
        let max_size = read_int(&team, &["maxSize", "max_size"]).or_else(|| {
            read_int(
                details,
                &["teamMaxSize", "team_max_size", "teamMaxParticipants"],
            )
        });

        let declared = read_bool(&team, &["isTeamEvent", "is_team_event"])
            .or_else(|| read_bool(details, &["isTeamEvent", "is_team_event", "teamBased"]))
            .unwrap_or(false);
        let inferred = max_size.unwrap_or(1) > 1 || min_size > 1;

        let description = read_string(&team, &["description"])
            .or_else(|| read_string(details, &["teamDescription", "team_description"]));

        TeamSizePolicy {
            is_team_event: declared || inferred,
            min_size,
            max_size,
            description,
        }
    }
}

fn read_int(value: &Value, keys: &[&str]) -> Option<i32> {
    keys.iter().find_map(|key| {
        value.get(key).and_then(|v| match v {
            Value::Number(n) => n.as_i64().map(|n| n as i32),
            // Organizer imports occasionally stringify numbers
            Value::String(s) => s.parse().ok(),
            _ => None,
        })
    })
}

fn read_bool(value: &Value, keys: &[&str]) -> Option<bool> {
    keys.iter()
        .find_map(|key| value.get(key).and_then(Value::as_bool))
}

fn read_string(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        value
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}
