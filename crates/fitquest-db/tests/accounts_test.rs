//! Integration tests for registration, login and bearer tokens.

use chrono::Duration;
use fitquest_db::test_fixtures::TestDatabase;
use fitquest_db::{Error, UpdateProfileRequest};

#[tokio::test]
#[ignore] // Requires database connection
async fn test_register_creates_level_one_profile() {
    let test_db = TestDatabase::new().await;
    let user = test_db.register_user().await;

    let profile = test_db.db.profiles.get(user.id).await.unwrap().unwrap();
    assert_eq!(profile.level, 1);
    assert_eq!(profile.experience, 0);
    assert_eq!(profile.total_points, 0);
}

#[tokio::test]
#[ignore] // Requires database connection
async fn test_duplicate_username_conflicts() {
    let test_db = TestDatabase::new().await;
    let username = TestDatabase::unique_username("dup");
    let req = TestDatabase::register_request(&username);

    test_db.db.users.register(&req).await.unwrap();
    let second = test_db.db.users.register(&req).await;
    assert!(matches!(second, Err(Error::Conflict(_))));
}

#[tokio::test]
#[ignore] // Requires database connection
async fn test_authenticate_checks_password() {
    let test_db = TestDatabase::new().await;
    let username = TestDatabase::unique_username("login");
    test_db
        .db
        .users
        .register(&TestDatabase::register_request(&username))
        .await
        .unwrap();

    let ok = test_db
        .db
        .users
        .authenticate(&username, "test-password-123")
        .await
        .unwrap();
    assert_eq!(ok.map(|u| u.username), Some(username.clone()));

    let bad = test_db
        .db
        .users
        .authenticate(&username, "wrong-password")
        .await
        .unwrap();
    assert!(bad.is_none());
}

#[tokio::test]
#[ignore] // Requires database connection
async fn test_token_issue_validate_refresh_revoke() {
    let test_db = TestDatabase::new().await;
    let user = test_db.register_user().await;
    let users = &test_db.db.users;

    let pair = users
        .issue_tokens(user.id, Duration::minutes(5), Duration::days(1))
        .await
        .unwrap();
    assert_eq!(
        users.validate_access_token(&pair.access).await.unwrap().map(|u| u.id),
        Some(user.id)
    );
    // A refresh token is not an access token.
    assert!(users
        .validate_access_token(&pair.refresh)
        .await
        .unwrap()
        .is_none());

    let (access, _) = users
        .refresh_access_token(&pair.refresh, Duration::minutes(5))
        .await
        .unwrap()
        .unwrap();
    assert!(users.validate_access_token(&access).await.unwrap().is_some());

    assert!(users.revoke_token(&pair.access).await.unwrap());
    assert!(users
        .validate_access_token(&pair.access)
        .await
        .unwrap()
        .is_none());
    assert!(!users.revoke_token(&pair.access).await.unwrap());
}

#[tokio::test]
#[ignore] // Requires database connection
async fn test_expired_access_token_rejected() {
    let test_db = TestDatabase::new().await;
    let user = test_db.register_user().await;

    let pair = test_db
        .db
        .users
        .issue_tokens(user.id, Duration::seconds(-1), Duration::days(1))
        .await
        .unwrap();
    assert!(test_db
        .db
        .users
        .validate_access_token(&pair.access)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
#[ignore] // Requires database connection
async fn test_update_profile_details_keeps_points() {
    let test_db = TestDatabase::new().await;
    let user = test_db.register_user().await;

    let updated = test_db
        .db
        .profiles
        .update_details(
            user.id,
            &UpdateProfileRequest {
                name: Some("홍길동".to_string()),
                height_cm: Some(170.0),
                weight_kg: Some(65.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "홍길동");
    assert_eq!(updated.height_cm, Some(170.0));
    assert_eq!(updated.level, 1);
    assert_eq!(updated.total_points, 0);

    let invalid = test_db
        .db
        .profiles
        .update_details(
            user.id,
            &UpdateProfileRequest {
                age: Some(400),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(invalid, Err(Error::InvalidInput(_))));
}
