//! Integration tests for the report and moderation queue

mod common;
use serial_test::serial;

use chrono::Utc;
use common::{database::*, fixtures::*};
use insightcast::notifications::NotificationType;
use insightcast::orm::{episodes, notifications, reports, users};
use insightcast::web::admin::resolve_report;
use sea_orm::{entity::*, query::*, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter};

async fn file_report(
    db: &sea_orm::DatabaseConnection,
    episode_id: i32,
    reporter_id: i32,
    reason: reports::Reason,
) -> reports::Model {
    reports::ActiveModel {
        episode_id: Set(episode_id),
        reporter_id: Set(reporter_id),
        reason: Set(reason),
        details: Set(Some("Something is off".to_string())),
        status: Set(reports::Status::Pending),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert report")
}

#[actix_rt::test]
#[serial]
async fn test_report_does_not_mutate_episode() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let author = create_test_user(&db, "reported_author", users::Role::Writer)
        .await
        .expect("Failed to create author");
    let reporter = create_test_user(&db, "reporter", users::Role::User)
        .await
        .expect("Failed to create reporter");
    let parent = create_test_series(&db, author.id, "Reported Series")
        .await
        .expect("Failed to create series");
    let episode = create_test_episode(&db, parent.id, author.id, "Reported Episode")
        .await
        .expect("Failed to create episode");

    let report = file_report(&db, episode.id, reporter.id, reports::Reason::Spam).await;
    assert_eq!(report.status, reports::Status::Pending);

    // The reported episode is untouched by the report.
    let after = episodes::Entity::find_by_id(episode.id)
        .one(&db)
        .await
        .expect("Query failed")
        .expect("Episode vanished");
    assert_eq!(after.is_deleted, Some(false));
    assert_eq!(after.title, episode.title);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_resolve_report_removes_it_and_notifies_reporter() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let author = create_test_user(&db, "resolve_author", users::Role::Writer)
        .await
        .expect("Failed to create author");
    let reporter = create_test_user(&db, "resolve_reporter", users::Role::User)
        .await
        .expect("Failed to create reporter");
    let admin = create_test_user(&db, "resolve_admin", users::Role::Admin)
        .await
        .expect("Failed to create admin");
    let parent = create_test_series(&db, author.id, "Series")
        .await
        .expect("Failed to create series");
    let episode = create_test_episode(&db, parent.id, author.id, "Episode")
        .await
        .expect("Failed to create episode");

    let report = file_report(&db, episode.id, reporter.id, reports::Reason::Broken).await;

    let resolved = resolve_report(&db, report.id, admin.id)
        .await
        .expect("Resolve failed");
    assert!(resolved);

    // The report is gone from the queue.
    assert!(reports::Entity::find_by_id(report.id)
        .one(&db)
        .await
        .expect("Query failed")
        .is_none());

    // The reporter got a private message from the resolving admin.
    let inbox = notifications::Entity::find()
        .filter(notifications::Column::RecipientId.eq(reporter.id))
        .all(&db)
        .await
        .expect("Query failed");
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].sender_id, admin.id);
    assert_eq!(inbox[0].type_, NotificationType::PrivateMessage.as_str());
    assert!(!inbox[0].is_read);

    // The reported episode still exists, unmodified.
    assert!(episodes::Entity::find_by_id(episode.id)
        .one(&db)
        .await
        .expect("Query failed")
        .is_some());

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_resolve_missing_report_reports_not_found() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let admin = create_test_user(&db, "lonely_admin", users::Role::Admin)
        .await
        .expect("Failed to create admin");

    let resolved = resolve_report(&db, 424_242, admin.id)
        .await
        .expect("Resolve query failed");
    assert!(!resolved);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
