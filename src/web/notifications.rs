//! User-facing notification endpoints

use super::error::ErrorBody;
use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::notifications;
use crate::orm::notifications as notifications_orm;
use actix_web::{error, get, put, web, Error, HttpResponse};
use serde::Serialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_notifications)
        .service(view_unread_count)
        .service(mark_all_read)
        .service(mark_read);
}

#[derive(Serialize)]
struct NotificationResponse {
    id: i32,
    sender_id: i32,
    #[serde(rename = "type")]
    type_: String,
    message: String,
    is_read: bool,
    created_at: chrono::NaiveDateTime,
}

impl From<notifications_orm::Model> for NotificationResponse {
    fn from(n: notifications_orm::Model) -> Self {
        Self {
            id: n.id,
            sender_id: n.sender_id,
            type_: n.type_,
            message: n.message,
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}

/// The caller's notifications, newest first.
#[get("/api/notifications")]
async fn view_notifications(client: ClientCtx) -> Result<HttpResponse, Error> {
    let user = client.require_login()?;

    let rows = notifications::for_user(get_db_pool(), user.id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let response: Vec<NotificationResponse> = rows.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(response))
}

#[get("/api/notifications/unread-count")]
async fn view_unread_count(client: ClientCtx) -> Result<HttpResponse, Error> {
    let user = client.require_login()?;

    let count = notifications::count_unread(get_db_pool(), user.id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "count": count })))
}

/// Mark one notification as read. Only the recipient may do so; a miss on
/// someone else's notification reads as not authorized.
#[put("/api/notifications/{id}/read")]
async fn mark_read(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let user = client.require_login()?;
    let db = get_db_pool();
    let notification_id = path.into_inner();

    let updated = notifications::mark_read(db, notification_id, user.id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    if !updated {
        use sea_orm::EntityTrait;
        let exists = notifications_orm::Entity::find_by_id(notification_id)
            .one(db)
            .await
            .map_err(error::ErrorInternalServerError)?
            .is_some();

        if exists {
            return Ok(HttpResponse::Unauthorized().json(ErrorBody {
                message: "Not authorized".to_string(),
            }));
        }
        return Ok(HttpResponse::NotFound().json(ErrorBody {
            message: "Notification not found".to_string(),
        }));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Notification marked as read" })))
}

#[put("/api/notifications/read-all")]
async fn mark_all_read(client: ClientCtx) -> Result<HttpResponse, Error> {
    let user = client.require_login()?;

    notifications::mark_all_read(get_db_pool(), user.id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "All notifications marked as read" })))
}
