//! Administration and moderation endpoints
//!
//! Every route here sits behind the admin gate. Role changes, writer
//! application review, user removal, the report queue, and notification
//! dispatch all live in this module.

use super::error::ErrorBody;
use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::notifications::{self, NotificationType};
use crate::orm::{
    comments, episode_likes, episodes, notifications as notifications_orm, reports, series,
    series_comments, series_likes, sessions, users,
};
use actix_web::{delete, error, get, post, put, web, Error, HttpResponse};
use chrono::Utc;
use sea_orm::{
    entity::*, query::*, ActiveEnum, ColumnTrait, Condition, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_users)
        .service(update_user_role)
        .service(reject_application)
        .service(delete_user)
        .service(view_reports)
        .service(resolve_report_route)
        .service(send_targeted_notification)
        .service(send_mass_notification);
}

#[derive(Serialize)]
struct AdminUserResponse {
    id: i32,
    username: String,
    email: String,
    role: users::Role,
    writer_application_status: users::ApplicationStatus,
    writer_application_reason: String,
}

impl From<users::Model> for AdminUserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            writer_application_status: user.writer_application_status,
            writer_application_reason: user.writer_application_reason,
        }
    }
}

/// Every non-admin account, newest first.
#[get("/api/admin/users")]
async fn view_users(client: ClientCtx) -> Result<HttpResponse, Error> {
    client.require_admin()?;
    let db = get_db_pool();

    let rows = users::Entity::find()
        .filter(users::Column::Role.ne(users::Role::Admin))
        .order_by_desc(users::Column::CreatedAt)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let response: Vec<AdminUserResponse> = rows.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(response))
}

#[derive(Deserialize)]
struct RoleUpdateData {
    role: users::Role,
}

/// Change a user's role and keep the writer application status in step:
/// promoting to writer approves it, demoting to user resets it.
pub async fn set_user_role(
    db: &DatabaseConnection,
    user_id: i32,
    new_role: users::Role,
    admin_id: i32,
) -> Result<Option<users::Model>, DbErr> {
    let user = match users::Entity::find_by_id(user_id).one(db).await? {
        Some(user) => user,
        None => return Ok(None),
    };

    let mut active: users::ActiveModel = user.into();
    active.role = Set(new_role.clone());
    match new_role {
        users::Role::Writer => {
            active.writer_application_status = Set(users::ApplicationStatus::Approved);
        }
        users::Role::User => {
            active.writer_application_status = Set(users::ApplicationStatus::None);
            active.writer_application_reason = Set(String::new());
        }
        users::Role::Admin => {}
    }
    active.updated_at = Set(Utc::now().naive_utc());

    let updated = active.update(db).await?;

    notifications::create_notification(
        db,
        updated.id,
        admin_id,
        NotificationType::PrivateMessage,
        format!("Your role has been updated to {}.", updated.role.as_str()),
    )
    .await?;

    Ok(Some(updated))
}

#[put("/api/admin/users/{id}/role")]
async fn update_user_role(
    client: ClientCtx,
    path: web::Path<i32>,
    data: web::Json<RoleUpdateData>,
) -> Result<HttpResponse, Error> {
    let admin = client.require_admin()?;
    let db = get_db_pool();

    match set_user_role(db, path.into_inner(), data.role.clone(), admin.id)
        .await
        .map_err(error::ErrorInternalServerError)?
    {
        Some(updated) => Ok(HttpResponse::Ok().json(AdminUserResponse::from(updated))),
        None => Ok(HttpResponse::NotFound().json(ErrorBody {
            message: "User not found".to_string(),
        })),
    }
}

/// Turn down a writer application and tell the applicant.
pub async fn reject_writer_application(
    db: &DatabaseConnection,
    user_id: i32,
    admin_id: i32,
) -> Result<Option<users::Model>, DbErr> {
    let user = match users::Entity::find_by_id(user_id).one(db).await? {
        Some(user) => user,
        None => return Ok(None),
    };

    let mut active: users::ActiveModel = user.into();
    active.writer_application_status = Set(users::ApplicationStatus::Rejected);
    active.writer_application_reason = Set(String::new());
    active.updated_at = Set(Utc::now().naive_utc());
    let updated = active.update(db).await?;

    notifications::create_notification(
        db,
        updated.id,
        admin_id,
        NotificationType::PrivateMessage,
        "We are sorry to let you know that your writer application was not approved at this time."
            .to_string(),
    )
    .await?;

    Ok(Some(updated))
}

#[put("/api/admin/users/{id}/reject")]
async fn reject_application(
    client: ClientCtx,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let admin = client.require_admin()?;
    let db = get_db_pool();
    let user_id = path.into_inner();

    let target = users::Entity::find_by_id(user_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let target = match target {
        Some(target) => target,
        None => {
            return Ok(HttpResponse::NotFound().json(ErrorBody {
                message: "User not found".to_string(),
            }))
        }
    };

    if target.role == users::Role::Admin {
        return Ok(HttpResponse::Forbidden().json(ErrorBody {
            message: "Cannot reject an admin".to_string(),
        }));
    }

    reject_writer_application(db, user_id, admin.id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Application rejected" })))
}

/// Remove a user together with their authored content: series they own
/// (episodes, comments, and likes underneath included), episodes they
/// wrote into other series, reports they filed, their sessions, and their
/// notification inbox. Comments they left on other people's content stay
/// so conversations keep their shape. Runs in one transaction.
pub async fn remove_user_with_content(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<(), DbErr> {
    let series_ids: Vec<i32> = series::Entity::find()
        .filter(series::Column::AuthorId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect();

    let mut episode_query =
        episodes::Entity::find().filter(episodes::Column::AuthorId.eq(user_id));
    if !series_ids.is_empty() {
        episode_query = episodes::Entity::find().filter(
            Condition::any()
                .add(episodes::Column::AuthorId.eq(user_id))
                .add(episodes::Column::SeriesId.is_in(series_ids.clone())),
        );
    }
    let episode_ids: Vec<i32> = episode_query
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
            .filter(episode_likes::Column::EpisodeId.is_in(episode_ids.clone()))
            .exec(&txn)
            .await?;
        episodes::Entity::delete_many()
            .filter(episodes::Column::Id.is_in(episode_ids))
            .exec(&txn)
            .await?;
    }

    if !series_ids.is_empty() {
        series_comments::Entity::delete_many()
            .filter(series_comments::Column::SeriesId.is_in(series_ids.clone()))
            .exec(&txn)
            .await?;
        series_likes::Entity::delete_many()
            .filter(series_likes::Column::SeriesId.is_in(series_ids.clone()))
            .exec(&txn)
            .await?;
        series::Entity::delete_many()
            .filter(series::Column::Id.is_in(series_ids))
            .exec(&txn)
            .await?;
    }

    reports::Entity::delete_many()
        .filter(reports::Column::ReporterId.eq(user_id))
        .exec(&txn)
        .await?;
    series_likes::Entity::delete_many()
        .filter(series_likes::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    episode_likes::Entity::delete_many()
        .filter(episode_likes::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    notifications_orm::Entity::delete_many()
        .filter(notifications_orm::Column::RecipientId.eq(user_id))
        .exec(&txn)
        .await?;
    sessions::Entity::delete_many()
        .filter(sessions::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    users::Entity::delete_many()
        .filter(users::Column::Id.eq(user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    log::info!("Removed user {} and their authored content", user_id);
    Ok(())
}

#[delete("/api/admin/users/{id}")]
async fn delete_user(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    client.require_admin()?;
    let db = get_db_pool();
    let user_id = path.into_inner();

    let target = users::Entity::find_by_id(user_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let target = match target {
        Some(target) => target,
        None => {
            return Ok(HttpResponse::NotFound().json(ErrorBody {
                message: "User not found".to_string(),
            }))
        }
    };

    if target.role == users::Role::Admin {
        return Ok(HttpResponse::Forbidden().json(ErrorBody {
            message: "Cannot delete an administrator".to_string(),
        }));
    }

    remove_user_with_content(db, user_id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "User and associated content removed"
    })))
}

#[derive(Serialize)]
struct ReporterInfo {
    id: i32,
    username: String,
    email: String,
}

#[derive(Serialize)]
struct ReportView {
    id: i32,
    episode_id: i32,
    episode_title: String,
    reporter: Option<ReporterInfo>,
    reason: reports::Reason,
    details: Option<String>,
    status: reports::Status,
    created_at: chrono::NaiveDateTime,
}

/// Pending reports, oldest first.
#[get("/api/admin/reports")]
async fn view_reports(client: ClientCtx) -> Result<HttpResponse, Error> {
    client.require_admin()?;
    let db = get_db_pool();

    let report_models = reports::Entity::find()
        .filter(reports::Column::Status.eq(reports::Status::Pending))
        .order_by_asc(reports::Column::CreatedAt)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let mut report_views = Vec::with_capacity(report_models.len());
    for report in report_models {
        let episode_title = episodes::Entity::find_by_id(report.episode_id)
            .one(db)
            .await
            .map_err(error::ErrorInternalServerError)?
            .map(|e| e.title)
            .unwrap_or_else(|| "Episode deleted".to_string());

        let reporter = users::Entity::find_by_id(report.reporter_id)
            .one(db)
            .await
            .map_err(error::ErrorInternalServerError)?
            .map(|u| ReporterInfo {
                id: u.id,
                username: u.username,
                email: u.email,
            });

        report_views.push(ReportView {
            id: report.id,
            episode_id: report.episode_id,
            episode_title,
            reporter,
            reason: report.reason,
            details: report.details,
            status: report.status,
            created_at: report.created_at,
        });
    }

    Ok(HttpResponse::Ok().json(report_views))
}

/// Resolve a report: remove it from the queue and thank the reporter with
/// a notification. The reported episode itself is untouched.
pub async fn resolve_report(
    db: &DatabaseConnection,
    report_id: i32,
    admin_id: i32,
) -> Result<bool, DbErr> {
    let report = match reports::Entity::find_by_id(report_id).one(db).await? {
        Some(report) => report,
        None => return Ok(false),
    };

    reports::Entity::delete_by_id(report.id).exec(db).await?;

    notifications::create_notification(
        db,
        report.reporter_id,
        admin_id,
        NotificationType::PrivateMessage,
        format!(
            "Thank you for reporting \"{}\" content. We have reviewed the report and taken care of it.",
            report.reason.to_value()
        ),
    )
    .await?;

    Ok(true)
}

#[put("/api/admin/reports/{id}")]
async fn resolve_report_route(
    client: ClientCtx,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let admin = client.require_admin()?;
    let db = get_db_pool();

    let resolved = resolve_report(db, path.into_inner(), admin.id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    if !resolved {
        return Ok(HttpResponse::NotFound().json(ErrorBody {
            message: "Report not found".to_string(),
        }));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Report resolved and removed"
    })))
}

#[derive(Deserialize)]
struct NotifyData {
    message: String,
}

/// Broadcast an announcement to every user and writer. Best-effort: the
/// response reports how many recipients were addressed.
#[post("/api/admin/notify")]
async fn send_mass_notification(
    client: ClientCtx,
    data: web::Json<NotifyData>,
) -> Result<HttpResponse, Error> {
    let admin = client.require_admin()?;
    let db = get_db_pool();

    if data.message.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(ErrorBody {
            message: "Notification message is required.".to_string(),
        }));
    }

    let outcome = notifications::broadcast(db, admin.id, data.message.trim())
        .await
        .map_err(error::ErrorInternalServerError)?;

    if outcome.recipients == 0 {
        return Ok(HttpResponse::NotFound().json(ErrorBody {
            message: "No active users to notify.".to_string(),
        }));
    }

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": format!("Successfully sent notification to {} users.", outcome.created),
        "count": outcome.created,
    })))
}

/// Send a private notification to one recipient, who must exist.
#[post("/api/admin/notify/{recipient_id}")]
async fn send_targeted_notification(
    client: ClientCtx,
    path: web::Path<i32>,
    data: web::Json<NotifyData>,
) -> Result<HttpResponse, Error> {
    let admin = client.require_admin()?;
    let db = get_db_pool();
    let recipient_id = path.into_inner();

    if data.message.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(ErrorBody {
            message: "Notification message is required.".to_string(),
        }));
    }

    let recipient = users::Entity::find_by_id(recipient_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let recipient = match recipient {
        Some(recipient) => recipient,
        None => {
            return Ok(HttpResponse::NotFound().json(ErrorBody {
                message: "Recipient user not found.".to_string(),
            }))
        }
    };

    notifications::create_notification(
        db,
        recipient.id,
        admin.id,
        NotificationType::PrivateMessage,
        data.message.trim().to_string(),
    )
    .await
    .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": format!("Successfully sent private notification to {}.", recipient.username),
        "recipient": recipient.username,
    })))
}
