//! Test fixtures for creating test data
#![allow(dead_code)]
#![allow(clippy::needless_update)]

use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use chrono::Utc;
use insightcast::orm::{episodes, series, users};
use insightcast::user::Profile;
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};

/// Plain text password every fixture user gets.
pub const TEST_PASSWORD: &str = "password123";

/// Create a test user with known credentials and the given role.
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
    role: users::Role,
) -> Result<users::Model, DbErr> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = insightcast::session::get_argon2()
        .hash_password(TEST_PASSWORD.as_bytes(), &salt)
        .map_err(|e| DbErr::Custom(format!("Password hashing failed: {}", e)))?
        .to_string();

    let now = Utc::now().naive_utc();
    let user = users::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{}@test.com", username)),
        password: Set(password_hash),
        role: Set(role),
        writer_application_status: Set(users::ApplicationStatus::None),
        writer_application_reason: Set(String::new()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    user.insert(db).await
}

/// Caller profile for a fixture user, as the auth middleware would build it.
pub fn profile_for(user: &users::Model) -> Profile {
    Profile::from_model(user.clone())
}

/// Create an active series owned by the given author.
pub async fn create_test_series(
    db: &DatabaseConnection,
    author_id: i32,
    title: &str,
) -> Result<series::Model, DbErr> {
    let now = Utc::now().naive_utc();
    let row = series::ActiveModel {
        title: Set(title.to_string()),
        description: Set(format!("{} description", title)),
        category: Set(series::Category::Other),
        author_id: Set(author_id),
        is_deleted: Set(Some(false)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    row.insert(db).await
}

/// Create an active episode under a series.
pub async fn create_test_episode(
    db: &DatabaseConnection,
    series_id: i32,
    author_id: i32,
    title: &str,
) -> Result<episodes::Model, DbErr> {
    let now = Utc::now().naive_utc();
    let row = episodes::ActiveModel {
        title: Set(title.to_string()),
        content: Set(format!("{} content", title)),
        author_id: Set(author_id),
        series_id: Set(series_id),
        is_deleted: Set(Some(false)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    row.insert(db).await
}
