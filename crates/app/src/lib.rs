//! Unifest application composition root
//!
//! Wires configuration, the connection pool, and the teams domain into
//! ready-to-use objects. The persistence gateway is constructed here once
//! and injected everywhere; nothing else owns connection state.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use unifest_common::Config;
use unifest_teams::{
    EventProvider, PgEventProvider, TeamManager, TeamSizePolicy, TeamsRepositories,
};

/// Connect the shared pool from configuration.
pub async fn connect(config: &Config) -> Result<PgPool, anyhow::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_db_connections)
        .connect(&config.database_url)
        .await?;
    Ok(pool)
}

/// Construct the teams persistence gateway over an established pool.
pub fn build_repositories(pool: PgPool) -> TeamsRepositories {
    TeamsRepositories::new(pool)
}

/// Build a per-(event, user) session facade, deriving the team-size
/// policy from the event catalog. Unknown events fall back to a solo
/// policy, which leaves the session inert.
pub async fn team_manager(
    pool: PgPool,
    event_id: Uuid,
    user_id: Uuid,
) -> Result<TeamManager, anyhow::Error> {
    let events = PgEventProvider::new(pool.clone());
    let policy = match events.get_event(event_id).await? {
        Some(event) => event.team_policy(),
        None => TeamSizePolicy::default(),
    };

    let repos = build_repositories(pool);
    let mut manager = TeamManager::new(repos, event_id, user_id, policy);
    manager.refresh().await;
    Ok(manager)
}
