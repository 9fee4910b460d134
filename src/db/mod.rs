use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

pub mod queries;

/// Open the on-device SQLite database, creating the file if needed.
///
/// In-memory databases live only as long as their connection, so they get a
/// single connection that is never recycled.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let in_memory = database_url.contains(":memory:");

    let mut options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new()
            .max_connections(4)
            .idle_timeout(Duration::from_secs(600))
    };

    pool_options
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Create the `jobs` and `queued_jobs` tables if absent.
///
/// `created_at` keeps millisecond precision so listing order is stable for
/// records written within the same second.
pub async fn create_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id TEXT PRIMARY KEY,
            data TEXT NOT NULL,
            synced INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS queued_jobs (
            id TEXT PRIMARY KEY,
            data TEXT NOT NULL,
            retry_count INTEGER NOT NULL DEFAULT 0,
            error TEXT,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
