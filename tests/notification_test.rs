//! Integration tests for notification dispatch and read tracking

mod common;
use serial_test::serial;

use common::{database::*, fixtures::*};
use insightcast::notifications::{self, NotificationType};
use insightcast::orm::{notifications as notifications_orm, users};
use sea_orm::{query::*, ColumnTrait, EntityTrait, QueryFilter};

#[actix_rt::test]
#[serial]
async fn test_broadcast_reaches_users_and_writers_only() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let admin = create_test_user(&db, "broadcast_admin", users::Role::Admin)
        .await
        .expect("Failed to create admin");
    let user = create_test_user(&db, "broadcast_user", users::Role::User)
        .await
        .expect("Failed to create user");
    let writer = create_test_user(&db, "broadcast_writer", users::Role::Writer)
        .await
        .expect("Failed to create writer");
    let other_admin = create_test_user(&db, "broadcast_admin2", users::Role::Admin)
        .await
        .expect("Failed to create admin");

    let outcome = notifications::broadcast(&db, admin.id, "Site maintenance tonight")
        .await
        .expect("Broadcast failed");
    assert_eq!(outcome.recipients, 2);
    assert_eq!(outcome.created, 2);

    for recipient in [user.id, writer.id] {
        let inbox = notifications_orm::Entity::find()
            .filter(notifications_orm::Column::RecipientId.eq(recipient))
            .all(&db)
            .await
            .expect("Query failed");
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].type_, NotificationType::Announcement.as_str());
        assert_eq!(inbox[0].sender_id, admin.id);
        assert_eq!(inbox[0].message, "Site maintenance tonight");
    }

    // Admins are not broadcast recipients.
    let admin_inbox = notifications_orm::Entity::find()
        .filter(notifications_orm::Column::RecipientId.eq(other_admin.id))
        .count(&db)
        .await
        .expect("Query failed");
    assert_eq!(admin_inbox, 0);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_mark_read_is_scoped_to_recipient() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let admin = create_test_user(&db, "scoped_admin", users::Role::Admin)
        .await
        .expect("Failed to create admin");
    let recipient = create_test_user(&db, "scoped_recipient", users::Role::User)
        .await
        .expect("Failed to create recipient");
    let snoop = create_test_user(&db, "scoped_snoop", users::Role::User)
        .await
        .expect("Failed to create snoop");

    let notification_id = notifications::create_notification(
        &db,
        recipient.id,
        admin.id,
        NotificationType::PrivateMessage,
        "For your eyes only".to_string(),
    )
    .await
    .expect("Failed to create notification");

    // Someone else's mark-read attempt is a no-op.
    let updated = notifications::mark_read(&db, notification_id, snoop.id)
        .await
        .expect("Mark read failed");
    assert!(!updated);
    assert_eq!(
        notifications::count_unread(&db, recipient.id)
            .await
            .expect("Count failed"),
        1
    );

    let updated = notifications::mark_read(&db, notification_id, recipient.id)
        .await
        .expect("Mark read failed");
    assert!(updated);
    assert_eq!(
        notifications::count_unread(&db, recipient.id)
            .await
            .expect("Count failed"),
        0
    );

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_mark_all_read_clears_the_inbox() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let admin = create_test_user(&db, "inbox_admin", users::Role::Admin)
        .await
        .expect("Failed to create admin");
    let recipient = create_test_user(&db, "inbox_user", users::Role::User)
        .await
        .expect("Failed to create recipient");

    for i in 0..3 {
        notifications::create_notification(
            &db,
            recipient.id,
            admin.id,
            NotificationType::Announcement,
            format!("Announcement {}", i),
        )
        .await
        .expect("Failed to create notification");
    }

    assert_eq!(
        notifications::count_unread(&db, recipient.id)
            .await
            .expect("Count failed"),
        3
    );

    notifications::mark_all_read(&db, recipient.id)
        .await
        .expect("Mark all read failed");

    assert_eq!(
        notifications::count_unread(&db, recipient.id)
            .await
            .expect("Count failed"),
        0
    );

    // The records themselves are kept, just flagged read.
    let inbox = notifications::for_user(&db, recipient.id)
        .await
        .expect("Listing failed");
    assert_eq!(inbox.len(), 3);
    assert!(inbox.iter().all(|n| n.is_read));

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
