//! Reconciliation sweep detection against a real database

mod common;

use serial_test::serial;
use uuid::Uuid;

use common::TestApp;
use unifest_teams::ReconciliationSweep;

#[tokio::test]
#[serial]
#[ignore = "requires a configured PostgreSQL database"]
async fn sweep_detects_orphan_shapes() {
    let app = TestApp::new().await.unwrap();
    let event_id = app.seed_team_event(1, Some(4)).await.unwrap();

    // Orphaned team: inserted without a captain membership
    let orphan_team = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO teams (id, event_id, created_by, name, open_to_join, visibility, status) \
         VALUES ($1, $2, $3, 'Headless Crew', TRUE, 'public', 'draft')",
    )
    .bind(orphan_team)
    .bind(event_id)
    .bind(Uuid::new_v4())
    .execute(&app.pool)
    .await
    .unwrap();

    // Orphaned lock: locked with a captain but zero registrations
    let orphan_lock = Uuid::new_v4();
    let captain = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO teams (id, event_id, created_by, name, open_to_join, visibility, status) \
         VALUES ($1, $2, $3, 'Sealed Shut', FALSE, 'public', 'locked')",
    )
    .bind(orphan_lock)
    .bind(event_id)
    .bind(captain)
    .execute(&app.pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO team_members (team_id, user_id, role, status) \
         VALUES ($1, $2, 'captain', 'accepted')",
    )
    .bind(orphan_lock)
    .bind(captain)
    .execute(&app.pool)
    .await
    .unwrap();

    let report = ReconciliationSweep::new(app.pool.clone()).run().await.unwrap();

    assert!(report.orphaned_teams.contains(&orphan_team));
    assert!(report.orphaned_locks.contains(&orphan_lock));
    assert!(!report.orphaned_locks.contains(&orphan_team));
    assert!(!report.is_clean());
}
