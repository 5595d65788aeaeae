//! Notification records for user-facing announcements and moderation mail

pub mod types;

use crate::orm::{notifications, users};
use sea_orm::{entity::*, query::*, sea_query::Expr, DatabaseConnection, DbErr};

pub use types::NotificationType;

/// Create a notification for one recipient.
pub async fn create_notification(
    db: &DatabaseConnection,
    recipient_id: i32,
    sender_id: i32,
    notification_type: NotificationType,
    message: String,
) -> Result<i32, DbErr> {
    let notification = notifications::ActiveModel {
        recipient_id: Set(recipient_id),
        sender_id: Set(sender_id),
        type_: Set(notification_type.as_str().to_string()),
        message: Set(message),
        is_read: Set(false),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };

    let result = notification.insert(db).await?;
    Ok(result.id)
}

/// Outcome of a broadcast: how many recipients were addressed and how many
/// inserts actually landed.
pub struct BroadcastOutcome {
    pub recipients: usize,
    pub created: usize,
}

/// Announce to every user with the user or writer role.
///
/// Best-effort: a failed insert is logged and the remaining recipients are
/// still attempted, so one bad row cannot abort the batch.
pub async fn broadcast(
    db: &DatabaseConnection,
    sender_id: i32,
    message: &str,
) -> Result<BroadcastOutcome, DbErr> {
    let recipients = users::Entity::find()
        .filter(users::Column::Role.is_in([users::Role::User, users::Role::Writer]))
        .all(db)
        .await?;

    let mut created = 0;
    for user in &recipients {
        match create_notification(
            db,
            user.id,
            sender_id,
            NotificationType::Announcement,
            message.to_string(),
        )
        .await
        {
            Ok(_) => created += 1,
            Err(err) => {
                log::warn!(
                    "Broadcast insert failed for recipient {}: {}",
                    user.id,
                    err
                );
            }
        }
    }

    Ok(BroadcastOutcome {
        recipients: recipients.len(),
        created,
    })
}

/// Count unread notifications for a user.
pub async fn count_unread(db: &DatabaseConnection, user_id: i32) -> Result<usize, DbErr> {
    notifications::Entity::find()
        .filter(notifications::Column::RecipientId.eq(user_id))
        .filter(notifications::Column::IsRead.eq(false))
        .count(db)
        .await
}

/// Mark a notification as read. Scoped to the recipient; returns whether a
/// row was actually updated.
pub async fn mark_read(
    db: &DatabaseConnection,
    notification_id: i32,
    user_id: i32,
) -> Result<bool, DbErr> {
    let result = notifications::Entity::update_many()
        .col_expr(notifications::Column::IsRead, Expr::value(true))
        .filter(notifications::Column::Id.eq(notification_id))
        .filter(notifications::Column::RecipientId.eq(user_id))
        .exec(db)
        .await?;

    Ok(result.rows_affected > 0)
}

/// Mark all of a user's notifications as read.
pub async fn mark_all_read(db: &DatabaseConnection, user_id: i32) -> Result<(), DbErr> {
    notifications::Entity::update_many()
        .col_expr(notifications::Column::IsRead, Expr::value(true))
        .filter(notifications::Column::RecipientId.eq(user_id))
        .filter(notifications::Column::IsRead.eq(false))
        .exec(db)
        .await?;

    Ok(())
}

/// Fetch a user's notifications, newest first.
pub async fn for_user(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<notifications::Model>, DbErr> {
    notifications::Entity::find()
        .filter(notifications::Column::RecipientId.eq(user_id))
        .order_by_desc(notifications::Column::CreatedAt)
        .all(db)
        .await
}
