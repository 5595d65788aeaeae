//! End-to-end writer journey: apply, get approved, publish, trash, restore

mod common;
use serial_test::serial;

use common::{database::*, fixtures::*};
use insightcast::orm::{episodes, users};
use insightcast::trash;
use insightcast::user::Profile;
use insightcast::web::admin::set_user_role;
use insightcast::web::auth::{register_user, RegisterOutcome};
use sea_orm::{query::*, ColumnTrait, EntityTrait, QueryFilter};

#[actix_rt::test]
#[serial]
async fn test_full_writer_journey() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let admin = create_test_user(&db, "journey_admin", users::Role::Admin)
        .await
        .expect("Failed to create admin");

    // Register with a writer application.
    let outcome = register_user(&db, "aspiring@test.com", "password123", Some("Let me write"))
        .await
        .expect("Registration failed");
    let applicant = match outcome {
        RegisterOutcome::Created(user) => user,
        RegisterOutcome::EmailTaken => panic!("Fresh email reported as taken"),
    };
    assert_eq!(
        applicant.writer_application_status,
        users::ApplicationStatus::Pending
    );

    // Admin approves the application by promoting to writer.
    let approved = set_user_role(&db, applicant.id, users::Role::Writer, admin.id)
        .await
        .expect("Role update failed")
        .expect("Applicant not found");
    assert_eq!(approved.role, users::Role::Writer);
    let author = Profile::from_model(approved);

    // The new writer publishes a series with an episode.
    let series = create_test_series(&db, author.id, "First Series")
        .await
        .expect("Failed to create series");
    let episode = create_test_episode(&db, series.id, author.id, "Pilot")
        .await
        .expect("Failed to create episode");

    let public = episodes::Entity::find()
        .filter(episodes::Column::SeriesId.eq(series.id))
        .filter(trash::visible_filter::<episodes::Entity>())
        .all(&db)
        .await
        .expect("Query failed");
    assert_eq!(public.len(), 1);

    // The writer trashes the episode; it leaves the public listing and
    // shows up in their trash view.
    trash::move_to_trash::<episodes::Entity>(&db, episode.id, &author)
        .await
        .expect("Soft delete failed");

    let public = episodes::Entity::find()
        .filter(episodes::Column::SeriesId.eq(series.id))
        .filter(trash::visible_filter::<episodes::Entity>())
        .count(&db)
        .await
        .expect("Query failed");
    assert_eq!(public, 0);

    let trashed = episodes::Entity::find()
        .filter(trash::trashed_filter::<episodes::Entity>(&author))
        .all(&db)
        .await
        .expect("Query failed");
    assert_eq!(trashed.len(), 1);
    assert_eq!(trashed[0].id, episode.id);

    // An admin restores it and the episode is public again.
    let admin = profile_for(&admin);
    trash::restore::<episodes::Entity>(&db, episode.id, &admin)
        .await
        .expect("Restore failed");

    let public = episodes::Entity::find()
        .filter(episodes::Column::SeriesId.eq(series.id))
        .filter(trash::visible_filter::<episodes::Entity>())
        .all(&db)
        .await
        .expect("Query failed");
    assert_eq!(public.len(), 1);
    assert_eq!(public[0].title, "Pilot");
    assert!(public[0].deleted_at.is_none());

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
