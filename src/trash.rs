//! Shared soft-delete lifecycle for authored content
//!
//! Series and episodes move through Active -> Trashed -> Active (restore)
//! or Trashed -> purged (irreversible, cascades to dependents). The
//! [`Trashable`] trait names the lifecycle columns so both entities share
//! one implementation of the transitions and listing filters.
//!
//! Ownership is enforced inside the write query itself: a non-admin caller
//! only matches rows whose author column equals their own id, so a
//! concurrent role change cannot widen the blast radius between check and
//! write.

use crate::orm::{comments, episode_likes, episodes, series, series_comments, series_likes};
use crate::user::Profile;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    entity::*, query::*, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, TransactionTrait,
};

/// An entity with the soft-delete lifecycle columns.
pub trait Trashable: EntityTrait {
    fn id_column() -> Self::Column;
    fn author_column() -> Self::Column;
    fn is_deleted_column() -> Self::Column;
    fn deleted_at_column() -> Self::Column;
}

impl Trashable for series::Entity {
    fn id_column() -> Self::Column {
        series::Column::Id
    }
    fn author_column() -> Self::Column {
        series::Column::AuthorId
    }
    fn is_deleted_column() -> Self::Column {
        series::Column::IsDeleted
    }
    fn deleted_at_column() -> Self::Column {
        series::Column::DeletedAt
    }
}

impl Trashable for episodes::Entity {
    fn id_column() -> Self::Column {
        episodes::Column::Id
    }
    fn author_column() -> Self::Column {
        episodes::Column::AuthorId
    }
    fn is_deleted_column() -> Self::Column {
        episodes::Column::IsDeleted
    }
    fn deleted_at_column() -> Self::Column {
        episodes::Column::DeletedAt
    }
}

#[derive(Debug)]
pub enum TrashError {
    /// No row with that id (or, for restore/purge, none the caller may touch).
    NotFound,
    /// The row exists but belongs to someone else.
    NotOwner,
    Db(DbErr),
}

impl std::fmt::Display for TrashError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "entity not found"),
            Self::NotOwner => write!(f, "caller does not own this entity"),
            Self::Db(err) => write!(f, "database error: {}", err),
        }
    }
}

impl std::error::Error for TrashError {}

impl From<DbErr> for TrashError {
    fn from(err: DbErr) -> Self {
        Self::Db(err)
    }
}

/// Filter matching Active rows. Rows predating the lifecycle columns carry
/// a NULL `is_deleted` and count as active.
pub fn visible_filter<E: Trashable>() -> Condition {
    Condition::any()
        .add(E::is_deleted_column().eq(false))
        .add(E::is_deleted_column().is_null())
}

/// Filter matching Trashed rows, scoped to the caller's own rows unless
/// they are an admin.
pub fn trashed_filter<E: Trashable>(caller: &Profile) -> Condition {
    let mut cond = Condition::all().add(E::is_deleted_column().eq(true));
    if !caller.is_admin() {
        cond = cond.add(E::author_column().eq(caller.id));
    }
    cond
}

/// Active -> Trashed. Owner or admin only.
pub async fn move_to_trash<E: Trashable>(
    db: &DatabaseConnection,
    id: i32,
    caller: &Profile,
) -> Result<(), TrashError> {
    let mut update = E::update_many()
        .col_expr(E::is_deleted_column(), Expr::value(true))
        .col_expr(E::deleted_at_column(), Expr::value(Utc::now().naive_utc()))
        .filter(E::id_column().eq(id));

    if !caller.is_admin() {
        update = update.filter(E::author_column().eq(caller.id));
    }

    let result = update.exec(db).await?;
    if result.rows_affected == 0 {
        return Err(miss_reason::<E>(db, id).await?);
    }
    Ok(())
}

/// Trashed -> Active. Owner or admin only. Restoring an already-active row
/// is a no-op rather than an error.
pub async fn restore<E: Trashable>(
    db: &DatabaseConnection,
    id: i32,
    caller: &Profile,
) -> Result<(), TrashError> {
    let mut update = E::update_many()
        .col_expr(E::is_deleted_column(), Expr::value(false))
        .col_expr(
            E::deleted_at_column(),
            Expr::value(Option::<chrono::NaiveDateTime>::None),
        )
        .filter(E::id_column().eq(id));

    if !caller.is_admin() {
        update = update.filter(E::author_column().eq(caller.id));
    }

    let result = update.exec(db).await?;
    if result.rows_affected == 0 {
        return Err(miss_reason::<E>(db, id).await?);
    }
    Ok(())
}

/// Distinguish a missing row from one the caller may not touch.
async fn miss_reason<E: Trashable>(
    db: &DatabaseConnection,
    id: i32,
) -> Result<TrashError, DbErr> {
    let exists = E::find()
        .filter(E::id_column().eq(id))
        .one(db)
        .await?
        .is_some();

    Ok(if exists {
        TrashError::NotOwner
    } else {
        TrashError::NotFound
    })
}

/// Permanently delete a series with its episodes, both comment sets, and
/// all like rows. Runs in one transaction so a cascade cannot be left
/// half-applied.
pub async fn purge_series(
    db: &DatabaseConnection,
    series_id: i32,
    caller: &Profile,
) -> Result<(), TrashError> {
    let mut query = series::Entity::find().filter(series::Column::Id.eq(series_id));
    if !caller.is_admin() {
        query = query.filter(series::Column::AuthorId.eq(caller.id));
    }
    if query.one(db).await?.is_none() {
        return Err(miss_reason::<series::Entity>(db, series_id).await?);
    }

    let episode_ids: Vec<i32> = episodes::Entity::find()
        .filter(episodes::Column::SeriesId.eq(series_id))
        .all(db)
        .await?
        .into_iter()
        .map(|e| e.id)
        .collect();

    let txn = db.begin().await?;

    if !episode_ids.is_empty() {
        comments::Entity::delete_many()
            .filter(comments::Column::EpisodeId.is_in(episode_ids.clone()))
            .exec(&txn)
            .await?;
        episode_likes::Entity::delete_many()
            .filter(episode_likes::Column::EpisodeId.is_in(episode_ids))
            .exec(&txn)
            .await?;
    }

    episodes::Entity::delete_many()
        .filter(episodes::Column::SeriesId.eq(series_id))
        .exec(&txn)
        .await?;
    series_comments::Entity::delete_many()
        .filter(series_comments::Column::SeriesId.eq(series_id))
        .exec(&txn)
        .await?;
    series_likes::Entity::delete_many()
        .filter(series_likes::Column::SeriesId.eq(series_id))
        .exec(&txn)
        .await?;
    series::Entity::delete_many()
        .filter(series::Column::Id.eq(series_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    log::info!("Purged series {} by user {}", series_id, caller.id);
    Ok(())
}

/// Permanently delete an episode with its comments and like rows.
pub async fn purge_episode(
    db: &DatabaseConnection,
    episode_id: i32,
    caller: &Profile,
) -> Result<(), TrashError> {
    let mut query = episodes::Entity::find().filter(episodes::Column::Id.eq(episode_id));
    if !caller.is_admin() {
        query = query.filter(episodes::Column::AuthorId.eq(caller.id));
    }
    if query.one(db).await?.is_none() {
        return Err(miss_reason::<episodes::Entity>(db, episode_id).await?);
    }

    let txn = db.begin().await?;

    comments::Entity::delete_many()
        .filter(comments::Column::EpisodeId.eq(episode_id))
        .exec(&txn)
        .await?;
    episode_likes::Entity::delete_many()
        .filter(episode_likes::Column::EpisodeId.eq(episode_id))
        .exec(&txn)
        .await?;
    episodes::Entity::delete_many()
        .filter(episodes::Column::Id.eq(episode_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    log::info!("Purged episode {} by user {}", episode_id, caller.id);
    Ok(())
}
