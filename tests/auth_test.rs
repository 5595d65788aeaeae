//! Integration tests for registration, login, and bearer tokens

mod common;
use serial_test::serial;

use chrono::{Duration, Utc};
use common::{database::*, fixtures::*};
use insightcast::orm::{sessions, users};
use insightcast::session;
use insightcast::web::auth::{login_user, register_user, RegisterOutcome};
use sea_orm::{entity::*, ActiveValue::Set, EntityTrait};

#[actix_rt::test]
#[serial]
async fn test_register_creates_user_with_pending_application() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let outcome = register_user(&db, "writer.hopeful@test.com", "password123", Some("I write"))
        .await
        .expect("Registration failed");

    let user = match outcome {
        RegisterOutcome::Created(user) => user,
        RegisterOutcome::EmailTaken => panic!("Fresh email reported as taken"),
    };

    assert_eq!(user.username, "writer.hopeful");
    assert_eq!(user.email, "writer.hopeful@test.com");
    assert_eq!(user.role, users::Role::User);
    assert_eq!(
        user.writer_application_status,
        users::ApplicationStatus::Pending
    );
    assert_eq!(user.writer_application_reason, "I write");

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_register_without_reason_has_no_application() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let outcome = register_user(&db, "plain@test.com", "password123", None)
        .await
        .expect("Registration failed");

    let user = match outcome {
        RegisterOutcome::Created(user) => user,
        RegisterOutcome::EmailTaken => panic!("Fresh email reported as taken"),
    };

    assert_eq!(
        user.writer_application_status,
        users::ApplicationStatus::None
    );
    assert!(user.writer_application_reason.is_empty());

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_register_duplicate_email_rejected() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let first = register_user(&db, "dupe@test.com", "password123", None)
        .await
        .expect("Registration failed");
    assert!(matches!(first, RegisterOutcome::Created(_)));

    // Same address, different case and padding, must still collide.
    let second = register_user(&db, "  Dupe@Test.com ", "password456", None)
        .await
        .expect("Registration lookup failed");
    assert!(matches!(second, RegisterOutcome::EmailTaken));

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_login_verifies_password() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "login_user", users::Role::User)
        .await
        .expect("Failed to create user");

    let found = login_user(&db, &user.email, TEST_PASSWORD)
        .await
        .expect("Login query failed");
    assert_eq!(found.map(|u| u.id), Some(user.id));

    let wrong = login_user(&db, &user.email, "not-the-password")
        .await
        .expect("Login query failed");
    assert!(wrong.is_none());

    let unknown = login_user(&db, "nobody@test.com", TEST_PASSWORD)
        .await
        .expect("Login query failed");
    assert!(unknown.is_none());

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_bearer_token_round_trip() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "token_user", users::Role::Writer)
        .await
        .expect("Failed to create user");

    let token = session::new_session(&db, user.id)
        .await
        .expect("Failed to issue token");

    let profile = session::authenticate_bearer(&db, &format!("Bearer {}", token))
        .await
        .expect("Valid token rejected");
    assert_eq!(profile.id, user.id);
    assert_eq!(profile.role, users::Role::Writer);

    // Garbage and missing prefixes resolve to guests.
    assert!(session::authenticate_bearer(&db, token.as_str()).await.is_none());
    assert!(session::authenticate_bearer(&db, "Bearer not-a-token")
        .await
        .is_none());

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_expired_token_rejected_and_pruned() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "expired_user", users::Role::User)
        .await
        .expect("Failed to create user");

    let stale = sessions::ActiveModel {
        token: Set("stale-token".to_string()),
        user_id: Set(user.id),
        created_at: Set(Utc::now().naive_utc() - Duration::days(31)),
        expires_at: Set(Utc::now().naive_utc() - Duration::days(1)),
    };
    stale.insert(&db).await.expect("Failed to insert session");

    let profile = session::authenticate_bearer(&db, "Bearer stale-token").await;
    assert!(profile.is_none(), "Expired token must not authenticate");

    // The expired row is pruned on sight.
    let remaining = sessions::Entity::find_by_id("stale-token".to_string())
        .one(&db)
        .await
        .expect("Session lookup failed");
    assert!(remaining.is_none());

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
