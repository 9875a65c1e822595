pub mod queries;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Error;

pub use queries::categories::{Category, CategoryId, CategoryRef};
pub use queries::questions::Question;

pub async fn establish_connection(path: &str) -> Result<SqlitePool, Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true);
    SqlitePool::connect_with(options).await
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Connects to the database at `path` and brings its schema up to date.
/// Call once at startup; the returned pool is ready for every query.
pub async fn init(path: &str) -> Result<SqlitePool, Error> {
    let pool = establish_connection(path).await?;
    tracing::info!("Running db migrations...");
    run_migrations(&pool).await?;
    Ok(pool)
}

/// Same as [`init`] but backed by a private in-memory database.
///
/// The pool is pinned to a single connection that never expires: every
/// connection to `sqlite::memory:` would otherwise see its own empty database.
pub async fn init_in_memory() -> Result<SqlitePool, Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    run_migrations(&pool).await?;
    Ok(pool)
}
