//! Registration and login endpoints

use super::error::ErrorBody;
use crate::db::get_db_pool;
use crate::orm::users;
use crate::session::{get_argon2, new_session};
use actix_web::{error, post, web, Error, HttpResponse};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, SaltString},
    PasswordHasher, PasswordVerifier,
};
use chrono::Utc;
use sea_orm::{entity::*, query::*, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_register).service(post_login);
}

#[derive(Deserialize, Validate)]
pub struct RegisterData {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 1000))]
    pub password: String,
    /// Present when the user is applying for the writer role.
    pub writer_reason: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginData {
    pub email: String,
    pub password: String,
}

/// Profile payload returned from both auth endpoints.
#[derive(Serialize)]
pub struct AuthResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: users::Role,
    pub token: String,
}

pub enum RegisterOutcome {
    Created(users::Model),
    EmailTaken,
}

/// Create an account. Role is always `user` at registration; a writer
/// reason files a Pending application for an admin to review. The display
/// name is derived from the email local part.
pub async fn register_user(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
    writer_reason: Option<&str>,
) -> Result<RegisterOutcome, DbErr> {
    let email = email.trim().to_lowercase();

    let existing = users::Entity::find()
        .filter(users::Column::Email.eq(email.clone()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(RegisterOutcome::EmailTaken);
    }

    let username = email.split('@').next().unwrap_or(&email).to_owned();

    let password_hash = get_argon2()
        .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))
        .map_err(|e| DbErr::Custom(format!("Password hashing failed: {}", e)))?
        .to_string();

    let reason = writer_reason.map(str::trim).filter(|r| !r.is_empty());
    let now = Utc::now().naive_utc();

    let user = users::ActiveModel {
        username: Set(username),
        email: Set(email),
        password: Set(password_hash),
        role: Set(users::Role::User),
        writer_application_reason: Set(reason.unwrap_or_default().to_owned()),
        writer_application_status: Set(if reason.is_some() {
            users::ApplicationStatus::Pending
        } else {
            users::ApplicationStatus::None
        }),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let user = user.insert(db).await?;
    log::info!("New user registered: {} (user_id: {})", user.username, user.id);

    Ok(RegisterOutcome::Created(user))
}

/// Verify credentials. None means either the email is unknown or the
/// password does not match; callers report one generic message to avoid
/// account enumeration.
pub async fn login_user(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<Option<users::Model>, DbErr> {
    let email = email.trim().to_lowercase();

    let user = match users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(db)
        .await?
    {
        Some(user) => user,
        None => return Ok(None),
    };

    let parsed_hash = match PasswordHash::new(&user.password) {
        Ok(hash) => hash,
        Err(err) => {
            log::error!("Unparseable password hash for user {}: {}", user.id, err);
            return Ok(None);
        }
    };

    if get_argon2()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Ok(None);
    }

    Ok(Some(user))
}

#[post("/api/auth/register")]
async fn post_register(data: web::Json<RegisterData>) -> Result<HttpResponse, Error> {
    data.validate().map_err(|e| {
        log::debug!("Registration validation failed: {}", e);
        error::ErrorBadRequest("Invalid registration data")
    })?;

    let db = get_db_pool();

    let user = match register_user(db, &data.email, &data.password, data.writer_reason.as_deref())
        .await
        .map_err(error::ErrorInternalServerError)?
    {
        RegisterOutcome::Created(user) => user,
        RegisterOutcome::EmailTaken => {
            return Ok(HttpResponse::BadRequest().json(ErrorBody {
                message: "User already exists".to_string(),
            }))
        }
    };

    let token = new_session(db, user.id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Created().json(AuthResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        role: user.role,
        token,
    }))
}

#[post("/api/auth/login")]
async fn post_login(data: web::Json<LoginData>) -> Result<HttpResponse, Error> {
    let db = get_db_pool();

    let user = match login_user(db, &data.email, &data.password)
        .await
        .map_err(|e| {
            log::error!("Login lookup failed: {:?}", e);
            error::ErrorInternalServerError("DB error")
        })? {
        Some(user) => user,
        None => {
            log::debug!("Login failure for {}", data.email);
            return Ok(HttpResponse::Unauthorized().json(ErrorBody {
                message: "Invalid email or password".to_string(),
            }));
        }
    };

    let token = new_session(db, user.id)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        role: user.role,
        token,
    }))
}
