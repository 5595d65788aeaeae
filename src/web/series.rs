//! Series endpoints: CRUD, trash lifecycle, likes, and series comments

use super::episodes::{episode_response, EpisodeResponse};
use super::error::ErrorBody;
use crate::db::get_db_pool;
use crate::likes;
use crate::middleware::ClientCtx;
use crate::orm::{episodes, series, series_comments};
use crate::trash::{self, TrashError};
use crate::user::get_username;
use actix_web::{delete, error, get, post, put, web, Error, HttpResponse};
use chrono::Utc;
use sea_orm::{
    entity::*, query::*, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder,
};
use serde::{Deserialize, Serialize};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // The trash route must be registered before the dynamic {id} routes or
    // "trash" would be captured as an id.
    conf.service(view_public_series)
        .service(view_public_series_detail)
        .service(view_public_series_comments)
        .service(view_series_trash)
        .service(restore_series)
        .service(force_delete_series)
        .service(like_series)
        .service(create_series_comment)
        .service(delete_series_comment)
        .service(create_series)
        .service(view_my_series)
        .service(view_series)
        .service(update_series)
        .service(delete_series);
}

#[derive(Deserialize)]
pub struct NewSeriesData {
    pub title: String,
    pub desc: String,
    pub category: Option<series::Category>,
}

#[derive(Deserialize)]
pub struct UpdateSeriesData {
    pub title: Option<String>,
    pub desc: Option<String>,
    pub category: Option<series::Category>,
}

#[derive(Deserialize)]
pub struct NewCommentData {
    pub text: String,
}

#[derive(Serialize)]
pub struct AuthorInfo {
    pub id: i32,
    pub username: String,
}

#[derive(Serialize)]
pub struct SeriesResponse {
    pub id: i32,
    pub title: String,
    pub desc: String,
    pub category: series::Category,
    pub author: AuthorInfo,
    pub like_count: usize,
    pub likes: Vec<String>,
    pub deleted_at: Option<chrono::NaiveDateTime>,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Serialize)]
pub struct CommentResponse {
    pub id: i32,
    pub author: AuthorInfo,
    pub text: String,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Serialize)]
struct SeriesDetailResponse {
    series: SeriesResponse,
    episodes: Vec<EpisodeResponse>,
}

pub async fn series_response(
    db: &DatabaseConnection,
    series: series::Model,
) -> Result<SeriesResponse, DbErr> {
    let likers = likes::series_likers(db, series.id).await?;
    let username = get_username(db, series.author_id).await;

    Ok(SeriesResponse {
        id: series.id,
        title: series.title,
        desc: series.description,
        category: series.category,
        author: AuthorInfo {
            id: series.author_id,
            username,
        },
        like_count: likers.len(),
        likes: likers,
        deleted_at: series.deleted_at,
        created_at: series.created_at,
    })
}

async fn comment_response(
    db: &DatabaseConnection,
    comment: series_comments::Model,
) -> CommentResponse {
    let username = get_username(db, comment.author_id).await;
    CommentResponse {
        id: comment.id,
        author: AuthorInfo {
            id: comment.author_id,
            username,
        },
        text: comment.text,
        created_at: comment.created_at,
    }
}

/// Public catalogue of active series, newest first.
#[get("/api/series/public")]
async fn view_public_series() -> Result<HttpResponse, Error> {
    let db = get_db_pool();

    let rows = series::Entity::find()
        .filter(trash::visible_filter::<series::Entity>())
        .order_by_desc(series::Column::CreatedAt)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let mut response = Vec::with_capacity(rows.len());
    for row in rows {
        response.push(
            series_response(db, row)
                .await
                .map_err(error::ErrorInternalServerError)?,
        );
    }

    Ok(HttpResponse::Ok().json(response))
}

/// Public series page with its active episodes, oldest episode first.
/// A trashed series stays visible to its owner and to admins.
#[get("/api/series/public/{id}")]
async fn view_public_series_detail(
    client: ClientCtx,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let db = get_db_pool();
    let series_id = path.into_inner();

    let row = series::Entity::find_by_id(series_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let row = match row {
        Some(row) => row,
        None => {
            return Ok(HttpResponse::NotFound().json(ErrorBody {
                message: "Series not found".to_string(),
            }))
        }
    };

    if row.is_deleted.unwrap_or(false) && !client.can_modify(row.author_id) {
        return Ok(HttpResponse::NotFound().json(ErrorBody {
            message: "Series not found".to_string(),
        }));
    }

    let episode_rows = episodes::Entity::find()
        .filter(episodes::Column::SeriesId.eq(series_id))
        .filter(trash::visible_filter::<episodes::Entity>())
        .order_by_asc(episodes::Column::CreatedAt)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let mut episode_list = Vec::with_capacity(episode_rows.len());
    for episode in episode_rows {
        episode_list.push(
            episode_response(db, episode)
                .await
                .map_err(error::ErrorInternalServerError)?,
        );
    }

    Ok(HttpResponse::Ok().json(SeriesDetailResponse {
        series: series_response(db, row)
            .await
            .map_err(error::ErrorInternalServerError)?,
        episodes: episode_list,
    }))
}

#[post("/api/series")]
async fn create_series(
    client: ClientCtx,
    data: web::Json<NewSeriesData>,
) -> Result<HttpResponse, Error> {
    let user = client.require_login()?;
    let db = get_db_pool();

    if data.title.trim().is_empty() || data.desc.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(ErrorBody {
            message: "Please provide Title and Description".to_string(),
        }));
    }

    let now = Utc::now().naive_utc();
    let row = series::ActiveModel {
        title: Set(data.title.trim().to_owned()),
        description: Set(data.desc.trim().to_owned()),
        category: Set(data.category.clone().unwrap_or_default()),
        author_id: Set(user.id),
        is_deleted: Set(Some(false)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let row = row
        .insert(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Created().json(
        series_response(db, row)
            .await
            .map_err(error::ErrorInternalServerError)?,
    ))
}

/// Dashboard listing of the caller's own active series.
#[get("/api/series")]
async fn view_my_series(client: ClientCtx) -> Result<HttpResponse, Error> {
    let user = client.require_login()?;
    let db = get_db_pool();

    let rows = series::Entity::find()
        .filter(series::Column::AuthorId.eq(user.id))
        .filter(trash::visible_filter::<series::Entity>())
        .order_by_desc(series::Column::CreatedAt)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let mut response = Vec::with_capacity(rows.len());
    for row in rows {
        response.push(
            series_response(db, row)
                .await
                .map_err(error::ErrorInternalServerError)?,
        );
    }

    Ok(HttpResponse::Ok().json(response))
}

/// Single series for the edit form. Owner or admin only.
#[get("/api/series/{id}")]
async fn view_series(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    client.require_login()?;
    let db = get_db_pool();

    let row = series::Entity::find_by_id(path.into_inner())
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let row = match row {
        Some(row) => row,
        None => {
            return Ok(HttpResponse::NotFound().json(ErrorBody {
                message: "Series not found".to_string(),
            }))
        }
    };

    if !client.can_modify(row.author_id) {
        return Ok(HttpResponse::Unauthorized().json(ErrorBody {
            message: "Not authorized for this action".to_string(),
        }));
    }

    Ok(HttpResponse::Ok().json(
        series_response(db, row)
            .await
            .map_err(error::ErrorInternalServerError)?,
    ))
}

/// Partial update; absent fields keep their prior values.
#[put("/api/series/{id}")]
async fn update_series(
    client: ClientCtx,
    path: web::Path<i32>,
    data: web::Json<UpdateSeriesData>,
) -> Result<HttpResponse, Error> {
    client.require_login()?;
    let db = get_db_pool();

    let row = series::Entity::find_by_id(path.into_inner())
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let row = match row {
        Some(row) => row,
        None => {
            return Ok(HttpResponse::NotFound().json(ErrorBody {
                message: "Series not found".to_string(),
            }))
        }
    };

    if !client.can_modify(row.author_id) {
        return Ok(HttpResponse::Unauthorized().json(ErrorBody {
            message: "Not authorized for this action".to_string(),
        }));
    }

    let mut active: series::ActiveModel = row.into();
    if let Some(title) = data.title.as_ref().filter(|t| !t.trim().is_empty()) {
        active.title = Set(title.trim().to_owned());
    }
    if let Some(desc) = data.desc.as_ref().filter(|d| !d.trim().is_empty()) {
        active.description = Set(desc.trim().to_owned());
    }
    if let Some(category) = data.category.clone() {
        active.category = Set(category);
    }
    active.updated_at = Set(Utc::now().naive_utc());

    let row = active
        .update(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(
        series_response(db, row)
            .await
            .map_err(error::ErrorInternalServerError)?,
    ))
}

/// Soft delete: the series moves to the trash and out of public listings.
#[delete("/api/series/{id}")]
async fn delete_series(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let user = client.require_login()?;
    let db = get_db_pool();

    match trash::move_to_trash::<series::Entity>(db, path.into_inner(), user).await {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Moved series to trash"
        }))),
        Err(TrashError::NotOwner) => Ok(HttpResponse::Unauthorized().json(ErrorBody {
            message: "Not authorized to delete this series".to_string(),
        })),
        Err(TrashError::NotFound) => Ok(HttpResponse::NotFound().json(ErrorBody {
            message: "Series not found".to_string(),
        })),
        Err(TrashError::Db(err)) => Err(error::ErrorInternalServerError(err)),
    }
}

/// Trashed series of the caller (all trashed series for admins).
#[get("/api/series/trash")]
async fn view_series_trash(client: ClientCtx) -> Result<HttpResponse, Error> {
    let user = client.require_login()?;
    let db = get_db_pool();

    let rows = series::Entity::find()
        .filter(trash::trashed_filter::<series::Entity>(user))
        .order_by_desc(series::Column::DeletedAt)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let mut response = Vec::with_capacity(rows.len());
    for row in rows {
        response.push(
            series_response(db, row)
                .await
                .map_err(error::ErrorInternalServerError)?,
        );
    }

    Ok(HttpResponse::Ok().json(response))
}

#[put("/api/series/{id}/restore")]
async fn restore_series(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let user = client.require_login()?;
    let db = get_db_pool();

    match trash::restore::<series::Entity>(db, path.into_inner(), user).await {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Series restored successfully"
        }))),
        Err(TrashError::NotFound) | Err(TrashError::NotOwner) => {
            Ok(HttpResponse::NotFound().json(ErrorBody {
                message: "Series not found or not authorized".to_string(),
            }))
        }
        Err(TrashError::Db(err)) => Err(error::ErrorInternalServerError(err)),
    }
}

/// Purge: irreversibly removes the series, its episodes, and both comment
/// sets.
#[delete("/api/series/{id}/force")]
async fn force_delete_series(
    client: ClientCtx,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let user = client.require_login()?;
    let db = get_db_pool();

    match trash::purge_series(db, path.into_inner(), user).await {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Permanently deleted series and related data"
        }))),
        Err(TrashError::NotFound) | Err(TrashError::NotOwner) => {
            Ok(HttpResponse::NotFound().json(ErrorBody {
                message: "Series not found or not authorized".to_string(),
            }))
        }
        Err(TrashError::Db(err)) => Err(error::ErrorInternalServerError(err)),
    }
}

/// Toggle the caller's like on a series.
#[put("/api/series/{id}/like")]
async fn like_series(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let user = client.require_login()?;
    let db = get_db_pool();
    let series_id = path.into_inner();

    let exists = series::Entity::find_by_id(series_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .is_some();
    if !exists {
        return Ok(HttpResponse::NotFound().json(ErrorBody {
            message: "Series not found".to_string(),
        }));
    }

    let outcome = likes::toggle_series_like(db, series_id, user.id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": if outcome.liked { "Liked" } else { "Unliked" },
        "action": if outcome.liked { "liked" } else { "unliked" },
        "like_count": outcome.like_count,
        "likes": outcome.likers,
    })))
}

/// Public comment listing for a series, oldest first.
#[get("/api/series/public/{id}/comments")]
async fn view_public_series_comments(path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let db = get_db_pool();

    let rows = series_comments::Entity::find()
        .filter(series_comments::Column::SeriesId.eq(path.into_inner()))
        .order_by_asc(series_comments::Column::CreatedAt)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let mut response = Vec::with_capacity(rows.len());
    for row in rows {
        response.push(comment_response(db, row).await);
    }

    Ok(HttpResponse::Ok().json(response))
}

#[post("/api/series/{id}/comment")]
async fn create_series_comment(
    client: ClientCtx,
    path: web::Path<i32>,
    data: web::Json<NewCommentData>,
) -> Result<HttpResponse, Error> {
    let user = client.require_login()?;
    let db = get_db_pool();
    let series_id = path.into_inner();

    let exists = series::Entity::find_by_id(series_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .is_some();
    if !exists {
        return Ok(HttpResponse::NotFound().json(ErrorBody {
            message: "Series not found".to_string(),
        }));
    }

    if data.text.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(ErrorBody {
            message: "Comment text is required".to_string(),
        }));
    }

    let comment = series_comments::ActiveModel {
        series_id: Set(series_id),
        author_id: Set(user.id),
        text: Set(data.text.trim().to_owned()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };

    let comment = comment
        .insert(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Created().json(comment_response(db, comment).await))
}

#[delete("/api/series/{id}/comment/{comment_id}")]
async fn delete_series_comment(
    client: ClientCtx,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse, Error> {
    client.require_login()?;
    let db = get_db_pool();
    let (_series_id, comment_id) = path.into_inner();

    let comment = series_comments::Entity::find_by_id(comment_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let comment = match comment {
        Some(comment) => comment,
        None => {
            return Ok(HttpResponse::NotFound().json(ErrorBody {
                message: "Comment not found".to_string(),
            }))
        }
    };

    if !client.can_modify(comment.author_id) {
        return Ok(HttpResponse::Unauthorized().json(ErrorBody {
            message: "User not authorized".to_string(),
        }));
    }

    series_comments::Entity::delete_by_id(comment.id)
        .exec(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Comment removed" })))
}
