//! Episode endpoints: CRUD, trash lifecycle, likes, comments, and reports
//!
//! Episodes are served under the `/api/podcasts` wire paths the original
//! frontend consumes.

use super::error::ErrorBody;
use super::series::AuthorInfo;
use crate::db::get_db_pool;
use crate::likes;
use crate::middleware::ClientCtx;
use crate::orm::{comments, episodes, reports, series};
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
    conf.service(view_public_episode_comments)
        .service(view_episode_trash)
        .service(restore_episode)
        .service(force_delete_episode)
        .service(like_episode)
        .service(report_episode)
        .service(create_comment)
        .service(delete_comment)
        .service(view_episodes)
        .service(create_episode)
        .service(view_episode)
        .service(update_episode)
        .service(delete_episode);
}

#[derive(Deserialize)]
pub struct NewEpisodeData {
    pub title: String,
    pub content: String,
}

#[derive(Deserialize)]
pub struct UpdateEpisodeData {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Deserialize)]
pub struct NewCommentData {
    pub text: String,
}

#[derive(Deserialize)]
pub struct ReportData {
    pub reason: reports::Reason,
    pub details: Option<String>,
}

#[derive(Serialize)]
pub struct EpisodeResponse {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub series_id: i32,
    pub series_title: Option<String>,
    pub author: AuthorInfo,
    pub like_count: usize,
    pub likes: Vec<String>,
    pub deleted_at: Option<chrono::NaiveDateTime>,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Serialize)]
pub struct EpisodeCommentResponse {
    pub id: i32,
    pub author: AuthorInfo,
    pub text: String,
    pub created_at: chrono::NaiveDateTime,
}

pub async fn episode_response(
    db: &DatabaseConnection,
    episode: episodes::Model,
) -> Result<EpisodeResponse, DbErr> {
    let likers = likes::episode_likers(db, episode.id).await?;
    let username = get_username(db, episode.author_id).await;
    let series_title = series::Entity::find_by_id(episode.series_id)
        .one(db)
        .await?
        .map(|s| s.title);

    Ok(EpisodeResponse {
        id: episode.id,
        title: episode.title,
        content: episode.content,
        series_id: episode.series_id,
        series_title,
        author: AuthorInfo {
            id: episode.author_id,
            username,
        },
        like_count: likers.len(),
        likes: likers,
        deleted_at: episode.deleted_at,
        created_at: episode.created_at,
    })
}

async fn comment_response(db: &DatabaseConnection, comment: comments::Model) -> EpisodeCommentResponse {
    let username = get_username(db, comment.author_id).await;
    EpisodeCommentResponse {
        id: comment.id,
        author: AuthorInfo {
            id: comment.author_id,
            username,
        },
        text: comment.text,
        created_at: comment.created_at,
    }
}

/// Dashboard listing: own active episodes, or every active episode for
/// admins, newest first.
#[get("/api/podcasts")]
async fn view_episodes(client: ClientCtx) -> Result<HttpResponse, Error> {
    let user = client.require_login()?;
    let db = get_db_pool();

    let mut query = episodes::Entity::find()
        .filter(trash::visible_filter::<episodes::Entity>())
        .order_by_desc(episodes::Column::CreatedAt);

    if !user.is_admin() {
        query = query.filter(episodes::Column::AuthorId.eq(user.id));
    }

    let rows = query
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let mut response = Vec::with_capacity(rows.len());
    for row in rows {
        response.push(
            episode_response(db, row)
                .await
                .map_err(error::ErrorInternalServerError)?,
        );
    }

    Ok(HttpResponse::Ok().json(response))
}

/// Create an episode under an existing, active series.
#[post("/api/podcasts/{series_id}")]
async fn create_episode(
    client: ClientCtx,
    path: web::Path<i32>,
    data: web::Json<NewEpisodeData>,
) -> Result<HttpResponse, Error> {
    let user = client.require_login()?;
    let db = get_db_pool();
    let series_id = path.into_inner();

    if data.title.trim().is_empty() || data.content.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(ErrorBody {
            message: "Please provide Title and Content".to_string(),
        }));
    }

    let parent = series::Entity::find_by_id(series_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let active_parent = matches!(parent, Some(ref s) if !s.is_deleted.unwrap_or(false));
    if !active_parent {
        return Ok(HttpResponse::NotFound().json(ErrorBody {
            message: "Series not found".to_string(),
        }));
    }

    let now = Utc::now().naive_utc();
    let row = episodes::ActiveModel {
        title: Set(data.title.trim().to_owned()),
        content: Set(data.content.trim().to_owned()),
        author_id: Set(user.id),
        series_id: Set(series_id),
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
        episode_response(db, row)
            .await
            .map_err(error::ErrorInternalServerError)?,
    ))
}

/// Single episode for the edit form. Owner or admin only.
#[get("/api/podcasts/{id}")]
async fn view_episode(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    client.require_login()?;
    let db = get_db_pool();

    let row = episodes::Entity::find_by_id(path.into_inner())
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let row = match row {
        Some(row) => row,
        None => {
            return Ok(HttpResponse::NotFound().json(ErrorBody {
                message: "Podcast not found".to_string(),
            }))
        }
    };

    if !client.can_modify(row.author_id) {
        return Ok(HttpResponse::Unauthorized().json(ErrorBody {
            message: "Not authorized".to_string(),
        }));
    }

    Ok(HttpResponse::Ok().json(
        episode_response(db, row)
            .await
            .map_err(error::ErrorInternalServerError)?,
    ))
}

/// Partial update; absent fields keep their prior values.
#[put("/api/podcasts/{id}")]
async fn update_episode(
    client: ClientCtx,
    path: web::Path<i32>,
    data: web::Json<UpdateEpisodeData>,
) -> Result<HttpResponse, Error> {
    client.require_login()?;
    let db = get_db_pool();

    let row = episodes::Entity::find_by_id(path.into_inner())
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let row = match row {
        Some(row) => row,
        None => {
            return Ok(HttpResponse::NotFound().json(ErrorBody {
                message: "Podcast not found".to_string(),
            }))
        }
    };

    if !client.can_modify(row.author_id) {
        return Ok(HttpResponse::Unauthorized().json(ErrorBody {
            message: "Not authorized".to_string(),
        }));
    }

    let mut active: episodes::ActiveModel = row.into();
    if let Some(title) = data.title.as_ref().filter(|t| !t.trim().is_empty()) {
        active.title = Set(title.trim().to_owned());
    }
    if let Some(content) = data.content.as_ref().filter(|c| !c.trim().is_empty()) {
        active.content = Set(content.trim().to_owned());
    }
    active.updated_at = Set(Utc::now().naive_utc());

    let row = active
        .update(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(
        episode_response(db, row)
            .await
            .map_err(error::ErrorInternalServerError)?,
    ))
}

/// Soft delete: the episode moves to the trash.
#[delete("/api/podcasts/{id}")]
async fn delete_episode(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let user = client.require_login()?;
    let db = get_db_pool();

    match trash::move_to_trash::<episodes::Entity>(db, path.into_inner(), user).await {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Episode moved to trash"
        }))),
        Err(TrashError::NotOwner) => Ok(HttpResponse::Unauthorized().json(ErrorBody {
            message: "Not authorized to delete this episode".to_string(),
        })),
        Err(TrashError::NotFound) => Ok(HttpResponse::NotFound().json(ErrorBody {
            message: "Podcast not found".to_string(),
        })),
        Err(TrashError::Db(err)) => Err(error::ErrorInternalServerError(err)),
    }
}

/// Trashed episodes of the caller (all trashed episodes for admins).
#[get("/api/podcasts/trash")]
async fn view_episode_trash(client: ClientCtx) -> Result<HttpResponse, Error> {
    let user = client.require_login()?;
    let db = get_db_pool();

    let rows = episodes::Entity::find()
        .filter(trash::trashed_filter::<episodes::Entity>(user))
        .order_by_desc(episodes::Column::DeletedAt)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let mut response = Vec::with_capacity(rows.len());
    for row in rows {
        response.push(
            episode_response(db, row)
                .await
                .map_err(error::ErrorInternalServerError)?,
        );
    }

    Ok(HttpResponse::Ok().json(response))
}

#[put("/api/podcasts/{id}/restore")]
async fn restore_episode(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let user = client.require_login()?;
    let db = get_db_pool();

    match trash::restore::<episodes::Entity>(db, path.into_inner(), user).await {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Episode restored"
        }))),
        Err(TrashError::NotFound) | Err(TrashError::NotOwner) => {
            Ok(HttpResponse::NotFound().json(ErrorBody {
                message: "Podcast not found or not authorized".to_string(),
            }))
        }
        Err(TrashError::Db(err)) => Err(error::ErrorInternalServerError(err)),
    }
}

/// Purge: irreversibly removes the episode and its comments.
#[delete("/api/podcasts/{id}/force")]
async fn force_delete_episode(
    client: ClientCtx,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let user = client.require_login()?;
    let db = get_db_pool();

    match trash::purge_episode(db, path.into_inner(), user).await {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Episode permanently deleted"
        }))),
        Err(TrashError::NotFound) | Err(TrashError::NotOwner) => {
            Ok(HttpResponse::NotFound().json(ErrorBody {
                message: "Podcast not found or not authorized".to_string(),
            }))
        }
        Err(TrashError::Db(err)) => Err(error::ErrorInternalServerError(err)),
    }
}

/// Toggle the caller's like on an episode.
#[put("/api/podcasts/{id}/like")]
async fn like_episode(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let user = client.require_login()?;
    let db = get_db_pool();
    let episode_id = path.into_inner();

    let exists = episodes::Entity::find_by_id(episode_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .is_some();
    if !exists {
        return Ok(HttpResponse::NotFound().json(ErrorBody {
            message: "Podcast not found".to_string(),
        }));
    }

    let outcome = likes::toggle_episode_like(db, episode_id, user.id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": if outcome.liked { "Liked" } else { "Unliked" },
        "action": if outcome.liked { "liked" } else { "unliked" },
        "like_count": outcome.like_count,
        "likes": outcome.likers,
    })))
}

/// File a report against an episode. Creating a report never mutates the
/// reported content.
#[post("/api/podcasts/{id}/report")]
async fn report_episode(
    client: ClientCtx,
    path: web::Path<i32>,
    data: web::Json<ReportData>,
) -> Result<HttpResponse, Error> {
    let user = client.require_login()?;
    let db = get_db_pool();
    let episode_id = path.into_inner();

    let exists = episodes::Entity::find_by_id(episode_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .is_some();
    if !exists {
        return Ok(HttpResponse::NotFound().json(ErrorBody {
            message: "Podcast not found".to_string(),
        }));
    }

    let report = reports::ActiveModel {
        episode_id: Set(episode_id),
        reporter_id: Set(user.id),
        reason: Set(data.reason.clone()),
        details: Set(data.details.clone()),
        status: Set(reports::Status::Pending),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };

    report
        .insert(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Report submitted successfully"
    })))
}

/// Public comment listing for an episode, oldest first.
#[get("/api/podcasts/public/{id}/comments")]
async fn view_public_episode_comments(path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let db = get_db_pool();

    let rows = comments::Entity::find()
        .filter(comments::Column::EpisodeId.eq(path.into_inner()))
        .order_by_asc(comments::Column::CreatedAt)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let mut response = Vec::with_capacity(rows.len());
    for row in rows {
        response.push(comment_response(db, row).await);
    }

    Ok(HttpResponse::Ok().json(response))
}

#[post("/api/podcasts/{id}/comment")]
async fn create_comment(
    client: ClientCtx,
    path: web::Path<i32>,
    data: web::Json<NewCommentData>,
) -> Result<HttpResponse, Error> {
    let user = client.require_login()?;
    let db = get_db_pool();
    let episode_id = path.into_inner();

    let exists = episodes::Entity::find_by_id(episode_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .is_some();
    if !exists {
        return Ok(HttpResponse::NotFound().json(ErrorBody {
            message: "Podcast not found".to_string(),
        }));
    }

    if data.text.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(ErrorBody {
            message: "Comment text is required".to_string(),
        }));
    }

    let comment = comments::ActiveModel {
        episode_id: Set(episode_id),
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

#[delete("/api/podcasts/{id}/comment/{comment_id}")]
async fn delete_comment(
    client: ClientCtx,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse, Error> {
    client.require_login()?;
    let db = get_db_pool();
    let (_episode_id, comment_id) = path.into_inner();

    let comment = comments::Entity::find_by_id(comment_id)
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
            message: "Not authorized".to_string(),
        }));
    }

    comments::Entity::delete_by_id(comment.id)
        .exec(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Comment removed" })))
}
