use crate::orm::users;
use sea_orm::{DatabaseConnection, EntityTrait};

/// Caller-facing slice of a user record, attached to the request context
/// by the auth middleware. Never carries the password hash.
#[derive(Clone, Debug)]
pub struct Profile {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: users::Role,
}

impl Profile {
    pub async fn get_by_id(
        db: &DatabaseConnection,
        id: i32,
    ) -> Result<Option<Self>, sea_orm::DbErr> {
        Ok(users::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(Self::from_model))
    }

    pub fn from_model(user: users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == users::Role::Admin
    }
}

/// Resolve a display name, tolerating authors that have since been removed.
pub async fn get_username(db: &DatabaseConnection, id: i32) -> String {
    users::Entity::find_by_id(id)
        .one(db)
        .await
        .unwrap_or(None)
        .map(|u| u.username)
        .unwrap_or_else(|| "Unknown".to_string())
}
