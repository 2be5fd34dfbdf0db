//! Integration tests for mission generation and the user mission lifecycle.
//!
//! **IMPORTANT**: These tests require a fully migrated PostgreSQL database.
//! Run migrations first: `sqlx migrate run`

use fitquest_db::test_fixtures::TestDatabase;
use fitquest_db::{Coordinates, Error, MissionStatus};
use uuid::Uuid;

const ORIGIN: Coordinates = Coordinates {
    latitude: 36.8151,
    longitude: 127.1139,
};

#[tokio::test]
#[ignore] // Requires database connection
async fn test_generate_creates_and_assigns_once() {
    let test_db = TestDatabase::new().await;
    let user = test_db.register_user().await;
    let place = test_db.insert_place("Park", Some((36.8300, 127.1300))).await;

    let first = test_db
        .db
        .missions
        .generate(user.id, ORIGIN, std::slice::from_ref(&place))
        .await
        .unwrap();
    assert_eq!(first.created_missions, 1);
    assert_eq!(first.assigned_missions, 1);

    let second = test_db
        .db
        .missions
        .generate(user.id, ORIGIN, std::slice::from_ref(&place))
        .await
        .unwrap();
    assert_eq!(second.created_missions, 0);
    assert_eq!(second.assigned_missions, 0);

    let available = test_db
        .db
        .missions
        .list_for_user(user.id, MissionStatus::Available)
        .await
        .unwrap();
    let ours: Vec<_> = available
        .iter()
        .filter(|d| d.place.id == place.id)
        .collect();
    assert_eq!(ours.len(), 1);
    assert!(ours[0].mission.title.ends_with("방문하기"));
}

#[tokio::test]
#[ignore] // Requires database connection
async fn test_existing_mission_assigned_to_second_user() {
    let test_db = TestDatabase::new().await;
    let alice = test_db.register_user().await;
    let bob = test_db.register_user().await;
    let place = test_db.insert_place("Gym", Some((36.80, 127.10))).await;
    let places = vec![place.clone()];

    test_db
        .db
        .missions
        .generate(alice.id, ORIGIN, &places)
        .await
        .unwrap();
    let outcome = test_db
        .db
        .missions
        .generate(bob.id, ORIGIN, &places)
        .await
        .unwrap();

    assert_eq!(outcome.created_missions, 0);
    assert_eq!(outcome.assigned_missions, 1);
}

#[tokio::test]
#[ignore] // Requires database connection
async fn test_full_lifecycle_credits_profile_once() {
    let test_db = TestDatabase::new().await;
    let user = test_db.register_user().await;
    let place = test_db.insert_place("Track", Some((36.8151, 127.1139))).await;
    test_db
        .db
        .missions
        .generate(user.id, ORIGIN, std::slice::from_ref(&place))
        .await
        .unwrap();

    let detail = test_db
        .db
        .missions
        .list_for_user(user.id, MissionStatus::Available)
        .await
        .unwrap()
        .into_iter()
        .find(|d| d.place.id == place.id)
        .unwrap();
    let mission_id = detail.mission.id;
    let reward = detail.mission.total_points();

    let started = test_db
        .db
        .missions
        .start(user.id, mission_id, 0.0)
        .await
        .unwrap();
    assert_eq!(started.user_mission.status, MissionStatus::Ongoing);

    let outcome = test_db
        .db
        .missions
        .complete(user.id, mission_id)
        .await
        .unwrap();
    assert_eq!(outcome.user_mission.status, MissionStatus::Completed);
    assert_eq!(outcome.user_mission.points_earned, reward);
    assert_eq!(outcome.profile.total_points, i64::from(reward));
    assert_eq!(outcome.ledger_entry.points, i64::from(reward));

    let again = test_db.db.missions.complete(user.id, mission_id).await;
    assert!(matches!(again, Err(Error::InvalidTransition(_))));

    let profile = test_db.db.profiles.get(user.id).await.unwrap().unwrap();
    assert_eq!(profile.total_points, i64::from(reward));

    let ledger = test_db.db.profiles.ledger(user.id, 10).await.unwrap();
    assert_eq!(ledger.len(), 1);

    let stats = test_db
        .db
        .missions
        .stats(user.id, chrono::Utc::now())
        .await
        .unwrap();
    assert_eq!(stats.total_completed, 1);
    assert_eq!(stats.weekly_completed, 1);
    assert_eq!(stats.ongoing, 0);
}

#[tokio::test]
#[ignore] // Requires database connection
async fn test_cancel_returns_to_available() {
    let test_db = TestDatabase::new().await;
    let user = test_db.register_user().await;
    let place = test_db.insert_place("Pool", Some((36.79, 127.12))).await;
    test_db
        .db
        .missions
        .generate(user.id, ORIGIN, std::slice::from_ref(&place))
        .await
        .unwrap();
    let mission_id = test_db
        .db
        .missions
        .list_for_user(user.id, MissionStatus::Available)
        .await
        .unwrap()
        .into_iter()
        .find(|d| d.place.id == place.id)
        .unwrap()
        .mission
        .id;

    assert!(matches!(
        test_db.db.missions.cancel(user.id, mission_id).await,
        Err(Error::InvalidTransition(_))
    ));

    test_db
        .db
        .missions
        .start(user.id, mission_id, 1.2)
        .await
        .unwrap();
    let cancelled = test_db
        .db
        .missions
        .cancel(user.id, mission_id)
        .await
        .unwrap();
    assert_eq!(cancelled.user_mission.status, MissionStatus::Available);
    assert_eq!(cancelled.user_mission.started_at, None);
    assert_eq!(cancelled.user_mission.distance_from_user, None);
}

#[tokio::test]
#[ignore] // Requires database connection
async fn test_transition_on_unassigned_mission_is_not_found() {
    let test_db = TestDatabase::new().await;
    let user = test_db.register_user().await;

    let result = test_db
        .db
        .missions
        .start(user.id, Uuid::new_v4(), 0.0)
        .await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
#[ignore] // Requires database connection
async fn test_inactive_missions_hidden_from_available() {
    let test_db = TestDatabase::new().await;
    let user = test_db.register_user().await;
    let place = test_db.insert_place("Hill", Some((36.85, 127.15))).await;
    test_db
        .db
        .missions
        .generate(user.id, ORIGIN, std::slice::from_ref(&place))
        .await
        .unwrap();
    let mission_id = test_db
        .db
        .missions
        .list_for_user(user.id, MissionStatus::Available)
        .await
        .unwrap()
        .into_iter()
        .find(|d| d.place.id == place.id)
        .unwrap()
        .mission
        .id;

    assert!(test_db
        .db
        .missions
        .set_active(mission_id, false)
        .await
        .unwrap());
    let available = test_db
        .db
        .missions
        .list_for_user(user.id, MissionStatus::Available)
        .await
        .unwrap();
    assert!(available.iter().all(|d| d.place.id != place.id));
}
