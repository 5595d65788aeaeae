//! Integration tests for admin user management

mod common;
use serial_test::serial;

use chrono::Utc;
use common::{database::*, fixtures::*};
use insightcast::orm::{comments, episodes, notifications, series, users};
use insightcast::web::admin::{
    reject_writer_application, remove_user_with_content, set_user_role,
};
use sea_orm::{entity::*, query::*, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter};

#[actix_rt::test]
#[serial]
async fn test_promoting_to_writer_approves_application() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let admin = create_test_user(&db, "role_admin", users::Role::Admin)
        .await
        .expect("Failed to create admin");
    let applicant = create_test_user(&db, "applicant", users::Role::User)
        .await
        .expect("Failed to create applicant");

    let updated = set_user_role(&db, applicant.id, users::Role::Writer, admin.id)
        .await
        .expect("Role update failed")
        .expect("User not found");

    assert_eq!(updated.role, users::Role::Writer);
    assert_eq!(
        updated.writer_application_status,
        users::ApplicationStatus::Approved
    );

    // The user is told about the promotion.
    let inbox = notifications::Entity::find()
        .filter(notifications::Column::RecipientId.eq(applicant.id))
        .all(&db)
        .await
        .expect("Query failed");
    assert_eq!(inbox.len(), 1);
    assert!(inbox[0].message.contains("writer"));

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_demoting_to_user_resets_application() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let admin = create_test_user(&db, "demote_admin", users::Role::Admin)
        .await
        .expect("Failed to create admin");
    let writer = create_test_user(&db, "demoted_writer", users::Role::Writer)
        .await
        .expect("Failed to create writer");

    let updated = set_user_role(&db, writer.id, users::Role::User, admin.id)
        .await
        .expect("Role update failed")
        .expect("User not found");

    assert_eq!(updated.role, users::Role::User);
    assert_eq!(
        updated.writer_application_status,
        users::ApplicationStatus::None
    );
    assert!(updated.writer_application_reason.is_empty());

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_reject_application_notifies_applicant() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let admin = create_test_user(&db, "reject_admin", users::Role::Admin)
        .await
        .expect("Failed to create admin");
    let applicant = create_test_user(&db, "rejected_applicant", users::Role::User)
        .await
        .expect("Failed to create applicant");

    let updated = reject_writer_application(&db, applicant.id, admin.id)
        .await
        .expect("Reject failed")
        .expect("User not found");

    assert_eq!(
        updated.writer_application_status,
        users::ApplicationStatus::Rejected
    );
    assert!(updated.writer_application_reason.is_empty());
    assert_eq!(updated.role, users::Role::User, "Rejection must not change the role");

    let inbox = notifications::Entity::find()
        .filter(notifications::Column::RecipientId.eq(applicant.id))
        .count(&db)
        .await
        .expect("Query failed");
    assert_eq!(inbox, 1);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_remove_user_cascades_but_keeps_their_comments_elsewhere() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let doomed = create_test_user(&db, "doomed_writer", users::Role::Writer)
        .await
        .expect("Failed to create writer");
    let survivor = create_test_user(&db, "surviving_writer", users::Role::Writer)
        .await
        .expect("Failed to create writer");

    // Content authored by the doomed user.
    let doomed_series = create_test_series(&db, doomed.id, "Doomed's Series")
        .await
        .expect("Failed to create series");
    let doomed_episode = create_test_episode(&db, doomed_series.id, doomed.id, "Doomed's Episode")
        .await
        .expect("Failed to create episode");

    // Content owned by the survivor, with a comment from the doomed user.
    let other_series = create_test_series(&db, survivor.id, "Survivor's Series")
        .await
        .expect("Failed to create series");
    let other_episode = create_test_episode(&db, other_series.id, survivor.id, "Survivor's Episode")
        .await
        .expect("Failed to create episode");

    let stray_comment = comments::ActiveModel {
        episode_id: Set(other_episode.id),
        author_id: Set(doomed.id),
        text: Set("A comment that outlives its author".to_string()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(&db)
    .await
    .expect("Failed to insert comment");

    remove_user_with_content(&db, doomed.id)
        .await
        .expect("User removal failed");

    assert!(users::Entity::find_by_id(doomed.id)
        .one(&db)
        .await
        .expect("Query failed")
        .is_none());
    assert!(series::Entity::find_by_id(doomed_series.id)
        .one(&db)
        .await
        .expect("Query failed")
        .is_none());
    assert!(episodes::Entity::find_by_id(doomed_episode.id)
        .one(&db)
        .await
        .expect("Query failed")
        .is_none());

    // Conversations on other people's content keep their shape.
    assert!(comments::Entity::find_by_id(stray_comment.id)
        .one(&db)
        .await
        .expect("Query failed")
        .is_some());
    assert!(series::Entity::find_by_id(other_series.id)
        .one(&db)
        .await
        .expect("Query failed")
        .is_some());

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
