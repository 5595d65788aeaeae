//! Global database connection pool

use once_cell::sync::OnceCell;
use sea_orm::{Database, DatabaseConnection};

static DB_POOL: OnceCell<DatabaseConnection> = OnceCell::new();

/// Connect to the database and store the pool globally.
/// Panics if the connection fails or the pool is already set.
pub async fn init_db(database_url: String) {
    let pool = Database::connect(&database_url)
        .await
        .expect("Failed to connect to the database.");

    DB_POOL
        .set(pool)
        .expect("init_db called more than once.");

    log::info!("Database pool initialized.");
}

/// Returns the global connection pool.
/// Panics if `init_db` has not run.
pub fn get_db_pool() -> &'static DatabaseConnection {
    DB_POOL.get().expect("Database pool is not initialized.")
}
