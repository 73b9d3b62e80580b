//! External collaborator seams: event catalog and profile store
//!
//! The core never owns events or profiles; it reads them through these
//! traits. The Postgres implementations cover the common deployment where
//! both live in the same database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::policy::TeamSizePolicy;
use unifest_common::Result;

/// The slice of an event the team core needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventSummary {
    pub id: Uuid,
    pub title: String,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub details: serde_json::Value,
}

impl EventSummary {
    /// Team-size policy derived from the event's details
    pub fn team_policy(&self) -> TeamSizePolicy {
        TeamSizePolicy::from_details(&self.details)
    }

    /// Whether registration is still open at the given instant.
    /// No deadline means always open.
    pub fn registration_open(&self, at: DateTime<Utc>) -> bool {
        match self.registration_deadline {
            Some(deadline) => at <= deadline,
            None => true,
        }
    }
}

/// Read-only access to the event catalog
#[async_trait]
pub trait EventProvider: Send + Sync {
    async fn get_event(&self, event_id: Uuid) -> Result<Option<EventSummary>>;
}

/// Event catalog backed by the shared Postgres database
#[derive(Clone)]
pub struct PgEventProvider {
    pool: PgPool,
}

impl PgEventProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventProvider for PgEventProvider {
    async fn get_event(&self, event_id: Uuid) -> Result<Option<EventSummary>> {
        let row = sqlx::query_as::<_, EventSummary>(
            "SELECT id, title, registration_deadline, details FROM events WHERE id = $1",
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

/// A user's display profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: Option<String>,
}

/// Read-only access to display names
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profiles(&self, ids: &[Uuid]) -> Result<Vec<Profile>>;
}

/// Profile store backed by the shared Postgres database
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn get_profiles(&self, ids: &[Uuid]) -> Result<Vec<Profile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, Profile>(
            "SELECT id, full_name FROM profiles WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
