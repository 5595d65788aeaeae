//! Access tokens and password hashing
//!
//! Login issues a UUIDv4 token persisted in the sessions table. Requests
//! present it as `Authorization: Bearer <token>`; expired rows are deleted
//! lazily when seen.

use crate::orm::sessions;
use crate::user::Profile;
use argon2::Argon2;
use chrono::{Duration, Utc};
use once_cell::sync::OnceCell;
use sea_orm::{entity::*, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

static ARGON2: OnceCell<Argon2<'static>> = OnceCell::new();
static ARGON2_SECRET: OnceCell<Vec<u8>> = OnceCell::new();

/// Bearer tokens outlive the login by this much.
const TOKEN_LIFETIME_DAYS: i64 = 30;

/// Initialize the password hasher. When a `SALT` secret is present in the
/// environment the hasher is keyed with it; otherwise the unkeyed default
/// is used, which keeps local development working.
pub fn init() {
    let argon2 = match std::env::var("SALT") {
        Ok(salt) => {
            let secret = ARGON2_SECRET.get_or_init(|| salt.into_bytes());
            Argon2::new_with_secret(
                secret,
                argon2::Algorithm::default(),
                argon2::Version::default(),
                argon2::Params::default(),
            )
            .expect("SALT is not usable as an Argon2 secret.")
        }
        Err(_) => {
            log::warn!("SALT is unset; password hashes are not keyed with a server secret.");
            Argon2::default()
        }
    };

    if ARGON2.set(argon2).is_err() {
        log::debug!("session::init called more than once; keeping the first hasher.");
    }
}

/// Returns the process-wide Argon2 instance.
pub fn get_argon2() -> &'static Argon2<'static> {
    ARGON2.get_or_init(Argon2::default)
}

/// Issue a fresh bearer token for a user.
pub async fn new_session(db: &DatabaseConnection, user_id: i32) -> Result<String, DbErr> {
    let token = Uuid::new_v4().to_string();
    let now = Utc::now().naive_utc();

    let session = sessions::ActiveModel {
        token: Set(token.clone()),
        user_id: Set(user_id),
        created_at: Set(now),
        expires_at: Set(now + Duration::days(TOKEN_LIFETIME_DAYS)),
    };
    sessions::Entity::insert(session).exec(db).await?;

    Ok(token)
}

/// Remove a token, e.g. on logout.
pub async fn destroy_session(db: &DatabaseConnection, token: &str) -> Result<(), DbErr> {
    sessions::Entity::delete_many()
        .filter(sessions::Column::Token.eq(token))
        .exec(db)
        .await?;
    Ok(())
}

/// Resolve an `Authorization` header value to a caller profile.
///
/// Returns None for a malformed header, unknown token, expired token, or a
/// token whose user no longer exists. Expired rows are deleted on sight.
pub async fn authenticate_bearer(db: &DatabaseConnection, header: &str) -> Option<Profile> {
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }

    let session = match sessions::Entity::find_by_id(token.to_owned()).one(db).await {
        Ok(session) => session?,
        Err(err) => {
            log::error!("Session lookup failed: {}", err);
            return None;
        }
    };

    if session.expires_at < Utc::now().naive_utc() {
        if let Err(err) = destroy_session(db, &session.token).await {
            log::warn!("Failed to prune expired session: {}", err);
        }
        return None;
    }

    match Profile::get_by_id(db, session.user_id).await {
        Ok(profile) => profile,
        Err(err) => {
            log::error!("Profile lookup failed during auth: {}", err);
            None
        }
    }
}
