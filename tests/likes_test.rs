//! Integration tests for the like toggle

mod common;
use serial_test::serial;

use common::{database::*, fixtures::*};
use insightcast::likes;
use insightcast::orm::{episode_likes, series_likes, users};
use sea_orm::{query::*, ColumnTrait, EntityTrait, QueryFilter};

#[actix_rt::test]
#[serial]
async fn test_series_like_toggle_round_trip() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let author = create_test_user(&db, "liked_author", users::Role::Writer)
        .await
        .expect("Failed to create author");
    let fan = create_test_user(&db, "series_fan", users::Role::User)
        .await
        .expect("Failed to create fan");
    let row = create_test_series(&db, author.id, "Likeable Series")
        .await
        .expect("Failed to create series");

    let outcome = likes::toggle_series_like(&db, row.id, fan.id)
        .await
        .expect("Toggle failed");
    assert!(outcome.liked);
    assert_eq!(outcome.like_count, 1);
    assert_eq!(outcome.likers, vec!["series_fan".to_string()]);

    // Toggling again removes the like and restores the original set.
    let outcome = likes::toggle_series_like(&db, row.id, fan.id)
        .await
        .expect("Toggle failed");
    assert!(!outcome.liked);
    assert_eq!(outcome.like_count, 0);
    assert!(outcome.likers.is_empty());

    let rows = series_likes::Entity::find()
        .filter(series_likes::Column::SeriesId.eq(row.id))
        .count(&db)
        .await
        .expect("Query failed");
    assert_eq!(rows, 0, "No like rows may remain after a double toggle");

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_episode_likes_are_per_user() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let author = create_test_user(&db, "ep_like_author", users::Role::Writer)
        .await
        .expect("Failed to create author");
    let fan_a = create_test_user(&db, "fan_a", users::Role::User)
        .await
        .expect("Failed to create fan");
    let fan_b = create_test_user(&db, "fan_b", users::Role::User)
        .await
        .expect("Failed to create fan");

    let parent = create_test_series(&db, author.id, "Parent")
        .await
        .expect("Failed to create series");
    let episode = create_test_episode(&db, parent.id, author.id, "Episode One")
        .await
        .expect("Failed to create episode");

    likes::toggle_episode_like(&db, episode.id, fan_a.id)
        .await
        .expect("Toggle failed");
    let outcome = likes::toggle_episode_like(&db, episode.id, fan_b.id)
        .await
        .expect("Toggle failed");

    assert!(outcome.liked);
    assert_eq!(outcome.like_count, 2);
    let mut likers = outcome.likers.clone();
    likers.sort();
    assert_eq!(likers, vec!["fan_a".to_string(), "fan_b".to_string()]);

    // One fan unliking leaves the other's like alone.
    let outcome = likes::toggle_episode_like(&db, episode.id, fan_a.id)
        .await
        .expect("Toggle failed");
    assert!(!outcome.liked);
    assert_eq!(outcome.like_count, 1);
    assert_eq!(outcome.likers, vec!["fan_b".to_string()]);

    let remaining = episode_likes::Entity::find()
        .filter(episode_likes::Column::EpisodeId.eq(episode.id))
        .all(&db)
        .await
        .expect("Query failed");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].user_id, fan_b.id);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
