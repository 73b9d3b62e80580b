// Unifest - reconciliation sweep over team formation state

use tracing::{error, info, warn};

use unifest_common::Config;
use unifest_teams::ReconciliationSweep;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .pretty()
        .init();

    info!("Starting Unifest reconciliation sweep");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    let pool = unifest_app::connect(&config).await.map_err(|e| {
        error!("Failed to connect to database: {}", e);
        anyhow::anyhow!("Database connection failed: {}", e)
    })?;

    info!("Database connection established");

    let report = ReconciliationSweep::new(pool).run().await.map_err(|e| {
        error!("Sweep failed: {}", e);
        anyhow::anyhow!("Sweep failed: {}", e)
    })?;

    if report.is_clean() {
        info!("Sweep complete: no orphaned teams or locks found");
    } else {
        warn!(
            orphaned_teams = report.orphaned_teams.len(),
            orphaned_locks = report.orphaned_locks.len(),
            "Sweep complete: findings require operator attention"
        );
        for failure in report.into_failures() {
            warn!(code = failure.error_code(), "{}", failure);
        }
    }

    Ok(())
}
