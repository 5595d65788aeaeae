//! Like toggles for series and episodes
//!
//! A like is a (entity, user) row; toggling inserts the row when absent
//! and deletes it when present, so repeating a toggle always returns the
//! set to its prior state.

use crate::orm::{episode_likes, series_likes, users};
use chrono::Utc;
use sea_orm::{
    entity::*, query::*, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
};

/// Result of a toggle, with the refreshed aggregate for the response.
pub struct LikeOutcome {
    /// True if the toggle added the like, false if it removed one.
    pub liked: bool,
    pub like_count: usize,
    pub likers: Vec<String>,
}

pub async fn toggle_series_like(
    db: &DatabaseConnection,
    series_id: i32,
    user_id: i32,
) -> Result<LikeOutcome, DbErr> {
    let existing = series_likes::Entity::find()
        .filter(series_likes::Column::SeriesId.eq(series_id))
        .filter(series_likes::Column::UserId.eq(user_id))
        .one(db)
        .await?;

    let liked = if let Some(like) = existing {
        series_likes::Entity::delete_by_id(like.id).exec(db).await?;
        false
    } else {
        let like = series_likes::ActiveModel {
            series_id: Set(series_id),
            user_id: Set(user_id),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        };
        like.insert(db).await?;
        true
    };

    let likers = series_likers(db, series_id).await?;
    Ok(LikeOutcome {
        liked,
        like_count: likers.len(),
        likers,
    })
}

pub async fn toggle_episode_like(
    db: &DatabaseConnection,
    episode_id: i32,
    user_id: i32,
) -> Result<LikeOutcome, DbErr> {
    let existing = episode_likes::Entity::find()
        .filter(episode_likes::Column::EpisodeId.eq(episode_id))
        .filter(episode_likes::Column::UserId.eq(user_id))
        .one(db)
        .await?;

    let liked = if let Some(like) = existing {
        episode_likes::Entity::delete_by_id(like.id)
            .exec(db)
            .await?;
        false
    } else {
        let like = episode_likes::ActiveModel {
            episode_id: Set(episode_id),
            user_id: Set(user_id),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        };
        like.insert(db).await?;
        true
    };

    let likers = episode_likers(db, episode_id).await?;
    Ok(LikeOutcome {
        liked,
        like_count: likers.len(),
        likers,
    })
}

/// Usernames of everyone who liked a series.
pub async fn series_likers(
    db: &DatabaseConnection,
    series_id: i32,
) -> Result<Vec<String>, DbErr> {
    let user_ids: Vec<i32> = series_likes::Entity::find()
        .filter(series_likes::Column::SeriesId.eq(series_id))
        .all(db)
        .await?
        .into_iter()
        .map(|l| l.user_id)
        .collect();

    resolve_usernames(db, user_ids).await
}

/// Usernames of everyone who liked an episode.
pub async fn episode_likers(
    db: &DatabaseConnection,
    episode_id: i32,
) -> Result<Vec<String>, DbErr> {
    let user_ids: Vec<i32> = episode_likes::Entity::find()
        .filter(episode_likes::Column::EpisodeId.eq(episode_id))
        .all(db)
        .await?
        .into_iter()
        .map(|l| l.user_id)
        .collect();

    resolve_usernames(db, user_ids).await
}

async fn resolve_usernames(
    db: &DatabaseConnection,
    user_ids: Vec<i32>,
) -> Result<Vec<String>, DbErr> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }

    Ok(users::Entity::find()
        .filter(users::Column::Id.is_in(user_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| u.username)
        .collect())
}
