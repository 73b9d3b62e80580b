//! End-to-end team formation flows against a real database
//!
//! Run with a configured PostgreSQL instance:
//! `TEST_DATABASE_URL=... cargo test -p unifest-integration-tests -- --ignored`

mod common;

use serial_test::serial;
use uuid::Uuid;

use common::TestApp;
use unifest_common::Error;
use unifest_teams::{
    check_roster_bounds, CreateTeamInput, FinalizationEngine, MemberStatus, MembershipManager,
    PgProfileStore, ProfileStore, TeamRegistry, TeamSettingsPatch, TeamStatus, TeamVisibility,
};

fn public_team_input(name: &str, min_size: i32, max_size: Option<i32>) -> CreateTeamInput {
    CreateTeamInput {
        name: name.to_string(),
        description: None,
        min_size: Some(min_size),
        max_size,
        open_to_join: true,
        visibility: TeamVisibility::Public,
    }
}

fn private_team_input(name: &str, max_size: Option<i32>) -> CreateTeamInput {
    CreateTeamInput {
        name: name.to_string(),
        description: None,
        min_size: Some(1),
        max_size,
        open_to_join: true,
        visibility: TeamVisibility::Private,
    }
}

#[tokio::test]
#[serial]
#[ignore = "requires a configured PostgreSQL database"]
async fn scenario_a_create_join_accept_finalize() {
    let app = TestApp::new().await.unwrap();
    let event_id = app.seed_team_event(2, Some(2)).await.unwrap();
    let u1 = app.seed_profile("Asha Kapoor").await.unwrap();
    let u2 = app.seed_profile("Ben Ortega").await.unwrap();

    let registry = TeamRegistry::new(app.repos.clone());
    let memberships = MembershipManager::new(app.repos.clone());
    let finalizer = FinalizationEngine::new(app.repos.clone());

    // U1 creates the team and becomes an accepted captain
    let team = registry
        .create_team(event_id, u1, public_team_input("Byte Knights", 2, Some(2)))
        .await
        .unwrap();
    assert_eq!(team.status, TeamStatus::Draft);

    let with_members = app.repos.teams.get_with_members(team.id).await.unwrap().unwrap();
    assert_eq!(with_members.accepted_count(), 1);
    assert!(with_members.members[0].role.is_captain());

    // U2 requests to join -> pending
    let request = memberships
        .join_team(team.id, u2, Some("I know embedded C".to_string()))
        .await
        .unwrap();
    assert_eq!(request.status, MemberStatus::Pending);

    // Captain accepts -> accepted count reaches max
    memberships
        .update_member_status(team.id, u2, MemberStatus::Accepted)
        .await
        .unwrap();

    let with_members = app.repos.teams.get_with_members(team.id).await.unwrap().unwrap();
    assert_eq!(with_members.accepted_count(), 2);
    check_roster_bounds(&with_members.team, with_members.accepted_count()).unwrap();

    // Finalize: team locked, exactly one registration per accepted member
    let registrations = finalizer.finalize_team(team.id, event_id).await.unwrap();
    assert_eq!(registrations.len(), 2);

    let locked = app.repos.teams.get_by_id(team.id).await.unwrap().unwrap();
    assert_eq!(locked.status, TeamStatus::Locked);
    assert!(!locked.open_to_join);

    let rows = app.repos.registrations.list_for_team(team.id).await.unwrap();
    assert_eq!(rows.len(), 2);
    let mut registered: Vec<Uuid> = rows.iter().map(|r| r.user_id).collect();
    registered.sort();
    let mut expected = vec![u1, u2];
    expected.sort();
    assert_eq!(registered, expected);
}

#[tokio::test]
#[serial]
#[ignore = "requires a configured PostgreSQL database"]
async fn scenario_b_finalize_below_min_size_rejected() {
    let app = TestApp::new().await.unwrap();
    let event_id = app.seed_team_event(2, Some(2)).await.unwrap();
    let u1 = app.seed_profile("Asha Kapoor").await.unwrap();

    let registry = TeamRegistry::new(app.repos.clone());
    let team = registry
        .create_team(event_id, u1, public_team_input("Solo Captain", 2, Some(2)))
        .await
        .unwrap();

    // Only the captain is accepted; the caller-side bound check refuses
    let with_members = app.repos.teams.get_with_members(team.id).await.unwrap().unwrap();
    let err = check_roster_bounds(&with_members.team, with_members.accepted_count()).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(err.to_string().contains("at least 2"));

    // The team was never locked
    let team = app.repos.teams.get_by_id(team.id).await.unwrap().unwrap();
    assert_eq!(team.status, TeamStatus::Draft);
}

#[tokio::test]
#[serial]
#[ignore = "requires a configured PostgreSQL database"]
async fn finalize_with_no_accepted_members_rolls_back_lock() {
    let app = TestApp::new().await.unwrap();
    let event_id = app.seed_team_event(1, None).await.unwrap();
    let u1 = app.seed_profile("Asha Kapoor").await.unwrap();

    let registry = TeamRegistry::new(app.repos.clone());
    let team = registry
        .create_team(event_id, u1, public_team_input("Ghost Town", 1, None))
        .await
        .unwrap();

    // Strip the roster below the engine's own floor
    sqlx::query("DELETE FROM team_members WHERE team_id = $1")
        .bind(team.id)
        .execute(&app.pool)
        .await
        .unwrap();

    let finalizer = FinalizationEngine::new(app.repos.clone());
    let err = finalizer.finalize_team(team.id, event_id).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    // The lock rolled back with the rest of the transaction
    let team = app.repos.teams.get_by_id(team.id).await.unwrap().unwrap();
    assert_eq!(team.status, TeamStatus::Draft);
    assert_eq!(app.repos.registrations.count_for_team(team.id).await.unwrap(), 0);
}

#[tokio::test]
#[serial]
#[ignore = "requires a configured PostgreSQL database"]
async fn scenario_c_third_join_hits_capacity() {
    let app = TestApp::new().await.unwrap();
    let event_id = app.seed_team_event(1, Some(2)).await.unwrap();
    let u1 = app.seed_profile("Asha Kapoor").await.unwrap();
    let u2 = app.seed_profile("Ben Ortega").await.unwrap();
    let u3 = app.seed_profile("Chandra Lee").await.unwrap();

    let registry = TeamRegistry::new(app.repos.clone());
    let memberships = MembershipManager::new(app.repos.clone());

    let team = registry
        .create_team(event_id, u1, public_team_input("Duo Dynamo", 1, Some(2)))
        .await
        .unwrap();

    // Captain (accepted) + one pending request fill the active count
    memberships.join_team(team.id, u2, None).await.unwrap();

    let err = memberships.join_team(team.id, u3, None).await.unwrap_err();
    assert!(matches!(err, Error::Capacity(_)));
}

#[tokio::test]
#[serial]
#[ignore = "requires a configured PostgreSQL database"]
async fn scenario_d_code_join_counts_invited_toward_capacity() {
    let app = TestApp::new().await.unwrap();
    let event_id = app.seed_team_event(1, Some(4)).await.unwrap();
    let u1 = app.seed_profile("Asha Kapoor").await.unwrap();
    let u5 = app.seed_profile("Elif Demir").await.unwrap();

    let registry = TeamRegistry::new(app.repos.clone());
    let memberships = MembershipManager::new(app.repos.clone());

    let team = registry
        .create_team(event_id, u1, private_team_input("Cipher Club", Some(4)))
        .await
        .unwrap();
    let join_code = team.join_code.clone().unwrap();

    // Fill remaining seats: one accepted, one pending, one invited
    for status in ["accepted", "pending", "invited"] {
        sqlx::query(
            "INSERT INTO team_members (team_id, user_id, role, status, joined_at) \
             VALUES ($1, $2, 'member', $3::member_status, NOW())",
        )
        .bind(team.id)
        .bind(Uuid::new_v4())
        .bind(status)
        .execute(&app.pool)
        .await
        .unwrap();
    }

    let err = memberships.join_team_by_code(&join_code, u5).await.unwrap_err();
    assert!(matches!(err, Error::Capacity(_)));
}

#[tokio::test]
#[serial]
#[ignore = "requires a configured PostgreSQL database"]
async fn join_by_code_paths() {
    let app = TestApp::new().await.unwrap();
    let event_id = app.seed_team_event(1, Some(4)).await.unwrap();
    let u1 = app.seed_profile("Asha Kapoor").await.unwrap();
    let u2 = app.seed_profile("Ben Ortega").await.unwrap();

    let registry = TeamRegistry::new(app.repos.clone());
    let memberships = MembershipManager::new(app.repos.clone());

    // Unknown code -> not found
    let err = memberships.join_team_by_code("ZZZZZZ", u2).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    // Valid private team with room -> direct accepted membership
    let team = registry
        .create_team(event_id, u1, private_team_input("Cipher Club", Some(4)))
        .await
        .unwrap();
    let join_code = team.join_code.clone().unwrap();

    let joined = memberships.join_team_by_code(&join_code, u2).await.unwrap();
    assert_eq!(joined.team.id, team.id);
    let membership = app
        .repos
        .memberships
        .get_by_team_and_user(team.id, u2)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(membership.status, MemberStatus::Accepted);

    // Rejoining the same team -> conflict
    let err = memberships.join_team_by_code(&join_code, u2).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    // Locked team -> state error
    sqlx::query("UPDATE teams SET status = 'locked' WHERE id = $1")
        .bind(team.id)
        .execute(&app.pool)
        .await
        .unwrap();
    let u3 = app.seed_profile("Chandra Lee").await.unwrap();
    let err = memberships.join_team_by_code(&join_code, u3).await.unwrap_err();
    assert!(matches!(err, Error::State(_)));
}

#[tokio::test]
#[serial]
#[ignore = "requires a configured PostgreSQL database"]
async fn one_active_membership_per_event() {
    let app = TestApp::new().await.unwrap();
    let event_id = app.seed_team_event(1, Some(4)).await.unwrap();
    let u1 = app.seed_profile("Asha Kapoor").await.unwrap();
    let u2 = app.seed_profile("Ben Ortega").await.unwrap();
    let u3 = app.seed_profile("Chandra Lee").await.unwrap();

    let registry = TeamRegistry::new(app.repos.clone());
    let memberships = MembershipManager::new(app.repos.clone());

    let first = registry
        .create_team(event_id, u1, public_team_input("First Team", 1, Some(4)))
        .await
        .unwrap();
    let second = registry
        .create_team(event_id, u2, public_team_input("Second Team", 1, Some(4)))
        .await
        .unwrap();

    // U3 requests a spot on the first team, then tries the second
    memberships.join_team(first.id, u3, None).await.unwrap();
    let err = memberships.join_team(second.id, u3, None).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    // Re-requesting on the same team is an upsert, not a conflict
    memberships
        .join_team(first.id, u3, Some("updated note".to_string()))
        .await
        .unwrap();
    let row = app
        .repos
        .memberships
        .get_by_team_and_user(first.id, u3)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.request_note.as_deref(), Some("updated note"));
}

#[tokio::test]
#[serial]
#[ignore = "requires a configured PostgreSQL database"]
async fn cancel_join_request_is_idempotent() {
    let app = TestApp::new().await.unwrap();
    let event_id = app.seed_team_event(1, Some(4)).await.unwrap();
    let u1 = app.seed_profile("Asha Kapoor").await.unwrap();
    let u2 = app.seed_profile("Ben Ortega").await.unwrap();

    let registry = TeamRegistry::new(app.repos.clone());
    let memberships = MembershipManager::new(app.repos.clone());

    let team = registry
        .create_team(event_id, u1, public_team_input("Cancel Club", 1, Some(4)))
        .await
        .unwrap();
    memberships.join_team(team.id, u2, None).await.unwrap();

    memberships.cancel_join_request(team.id, u2).await.unwrap();
    // Second cancel finds nothing and still succeeds
    memberships.cancel_join_request(team.id, u2).await.unwrap();

    let row = app
        .repos
        .memberships
        .get_by_team_and_user(team.id, u2)
        .await
        .unwrap();
    assert!(row.is_none());
}

#[tokio::test]
#[serial]
#[ignore = "requires a configured PostgreSQL database"]
async fn locked_team_rejects_settings_and_member_updates() {
    let app = TestApp::new().await.unwrap();
    let event_id = app.seed_team_event(1, Some(4)).await.unwrap();
    let u1 = app.seed_profile("Asha Kapoor").await.unwrap();
    let u2 = app.seed_profile("Ben Ortega").await.unwrap();

    let registry = TeamRegistry::new(app.repos.clone());
    let memberships = MembershipManager::new(app.repos.clone());
    let finalizer = FinalizationEngine::new(app.repos.clone());

    let team = registry
        .create_team(event_id, u1, public_team_input("Lockdown", 1, Some(4)))
        .await
        .unwrap();
    memberships.join_team(team.id, u2, None).await.unwrap();
    finalizer.finalize_team(team.id, event_id).await.unwrap();

    let patch = TeamSettingsPatch {
        name: Some("Renamed".to_string()),
        ..Default::default()
    };
    let err = registry.update_settings(team.id, patch).await.unwrap_err();
    assert!(matches!(err, Error::State(_)));

    let err = memberships
        .update_member_status(team.id, u2, MemberStatus::Accepted)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::State(_)));

    let err = memberships.join_team(team.id, u2, None).await.unwrap_err();
    assert!(matches!(err, Error::State(_)));
}

#[tokio::test]
#[serial]
#[ignore = "requires a configured PostgreSQL database"]
async fn facade_session_flow() {
    let app = TestApp::new().await.unwrap();
    let event_id = app.seed_team_event(2, Some(3)).await.unwrap();
    let u1 = app.seed_profile("Asha Kapoor").await.unwrap();
    let u2 = app.seed_profile("Ben Ortega").await.unwrap();

    // Composition root derives the team-size policy from the event catalog
    let mut captain_session = unifest_app::team_manager(app.pool.clone(), event_id, u1)
        .await
        .unwrap();
    let mut member_session = unifest_app::team_manager(app.pool.clone(), event_id, u2)
        .await
        .unwrap();

    // min/max left unset are seeded from the event policy (2..3)
    let outcome = captain_session
        .create_team(CreateTeamInput {
            name: "Facade Five".to_string(),
            description: None,
            min_size: None,
            max_size: None,
            open_to_join: true,
            visibility: TeamVisibility::Public,
        })
        .await;
    assert!(outcome.is_ok(), "create failed: {:?}", outcome.error);
    let team = outcome.data.unwrap();
    assert_eq!(team.min_size, 2);
    assert_eq!(team.max_size, Some(3));

    // The snapshot is current immediately after the mutation
    let snapshot = captain_session.snapshot();
    assert_eq!(snapshot.teams.len(), 1);
    assert!(!snapshot.mutating);
    assert!(captain_session.my_team().is_some());

    let outcome = member_session.join_team(team.id, Some("count me in".to_string())).await;
    assert!(outcome.is_ok());
    assert_eq!(
        member_session.snapshot().membership.as_ref().unwrap().status,
        MemberStatus::Pending
    );

    let outcome = captain_session.update_member(team.id, u2, MemberStatus::Accepted).await;
    assert!(outcome.is_ok());

    let outcome = captain_session.finalize_team(team.id).await;
    assert!(outcome.is_ok(), "finalize failed: {:?}", outcome.error);
    assert_eq!(outcome.data.unwrap().len(), 2);
    assert_eq!(
        captain_session.snapshot().teams[0].team.status,
        TeamStatus::Locked
    );

    // The facade blocks leaving a locked team
    let outcome = member_session.leave_team(team.id).await;
    assert!(matches!(outcome.error, Some(Error::State(_))));

    // Member DTOs carry display names from the profile store
    let profiles = PgProfileStore::new(app.pool.clone())
        .get_profiles(&[u1, u2])
        .await
        .unwrap();
    assert_eq!(profiles.len(), 2);
    let roster = &captain_session.snapshot().teams[0];
    assert!(roster
        .members
        .iter()
        .any(|m| m.full_name.as_deref() == Some("Asha Kapoor")));
}

#[tokio::test]
#[serial]
#[ignore = "requires a configured PostgreSQL database"]
async fn finalize_converts_prior_solo_registration() {
    let app = TestApp::new().await.unwrap();
    let event_id = app.seed_team_event(1, Some(4)).await.unwrap();
    let u1 = app.seed_profile("Asha Kapoor").await.unwrap();

    // A solo registration exists before the team forms
    sqlx::query("INSERT INTO registrations (user_id, event_id, team_id) VALUES ($1, $2, NULL)")
        .bind(u1)
        .bind(event_id)
        .execute(&app.pool)
        .await
        .unwrap();

    let registry = TeamRegistry::new(app.repos.clone());
    let finalizer = FinalizationEngine::new(app.repos.clone());

    let team = registry
        .create_team(event_id, u1, public_team_input("Upgraded", 1, Some(4)))
        .await
        .unwrap();
    finalizer.finalize_team(team.id, event_id).await.unwrap();

    // Last write wins: the solo row became the team registration
    let registration = app
        .repos
        .registrations
        .get_for_user(event_id, u1)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(registration.team_id, Some(team.id));
}
