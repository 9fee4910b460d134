use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::models::job::{Job, QueuedJob};

/// Raw `jobs` row. `data` is the JSON snapshot of the full record.
#[derive(Debug)]
pub struct JobRow {
    pub id: String,
    pub data: String,
    pub synced: bool,
}

/// Raw `queued_jobs` row.
#[derive(Debug)]
pub struct QueuedJobRow {
    pub id: String,
    pub data: String,
    pub retry_count: i64,
    pub error: Option<String>,
}

fn job_row(row: SqliteRow) -> Result<JobRow, sqlx::Error> {
    Ok(JobRow {
        id: row.try_get("id")?,
        data: row.try_get("data")?,
        synced: row.try_get::<i64, _>("synced")? != 0,
    })
}

fn queued_job_row(row: SqliteRow) -> Result<QueuedJobRow, sqlx::Error> {
    Ok(QueuedJobRow {
        id: row.try_get("id")?,
        data: row.try_get("data")?,
        retry_count: row.try_get("retry_count")?,
        error: row.try_get("error")?,
    })
}

/// Insert or replace a job by id. A replaced row takes a fresh `created_at`.
pub async fn upsert_job(pool: &SqlitePool, job: &Job, data: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO jobs (id, data, synced)
        VALUES (?1, ?2, ?3)
        "#,
    )
    .bind(&job.id)
    .bind(data)
    .bind(job.synced as i64)
    .execute(pool)
    .await?;

    Ok(())
}

/// All jobs, newest first
pub async fn list_jobs(pool: &SqlitePool) -> Result<Vec<JobRow>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, data, synced
        FROM jobs
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(job_row).collect()
}

/// Get a job by ID
pub async fn get_job(pool: &SqlitePool, job_id: &str) -> Result<Option<JobRow>, sqlx::Error> {
    let row = sqlx::query("SELECT id, data, synced FROM jobs WHERE id = ?1")
        .bind(job_id)
        .fetch_optional(pool)
        .await?;

    row.map(job_row).transpose()
}

/// Update only the `synced` column. Returns the number of rows touched.
pub async fn update_job_synced(
    pool: &SqlitePool,
    job_id: &str,
    synced: bool,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE jobs SET synced = ?1 WHERE id = ?2")
        .bind(synced as i64)
        .bind(job_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn delete_job(pool: &SqlitePool, job_id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM jobs WHERE id = ?1")
        .bind(job_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Insert a queue entry. Fails with a unique violation if the id is already queued.
pub async fn insert_queued_job(
    pool: &SqlitePool,
    queued: &QueuedJob,
    data: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO queued_jobs (id, data, retry_count, error)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(queued.id())
    .bind(data)
    .bind(queued.retry_count as i64)
    .bind(queued.error.as_deref())
    .execute(pool)
    .await?;

    Ok(())
}

/// All queue entries, newest first
pub async fn list_queued_jobs(pool: &SqlitePool) -> Result<Vec<QueuedJobRow>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, data, retry_count, error
        FROM queued_jobs
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(queued_job_row).collect()
}

pub async fn delete_queued_job(pool: &SqlitePool, job_id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM queued_jobs WHERE id = ?1")
        .bind(job_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Overwrite retry bookkeeping for a queue entry
pub async fn update_queued_retry(
    pool: &SqlitePool,
    job_id: &str,
    retry_count: u32,
    error: Option<&str>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE queued_jobs SET retry_count = ?1, error = ?2 WHERE id = ?3")
        .bind(retry_count as i64)
        .bind(error)
        .bind(job_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn clear_queued_jobs(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM queued_jobs").execute(pool).await?;
    Ok(result.rows_affected())
}

/// Write a job and its queue entry in one transaction.
pub async fn insert_submission(
    pool: &SqlitePool,
    job: &Job,
    job_data: &str,
    queued: &QueuedJob,
    queued_data: &str,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT OR REPLACE INTO jobs (id, data, synced)
        VALUES (?1, ?2, ?3)
        "#,
    )
    .bind(&job.id)
    .bind(job_data)
    .bind(job.synced as i64)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO queued_jobs (id, data, retry_count, error)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(queued.id())
    .bind(queued_data)
    .bind(queued.retry_count as i64)
    .bind(queued.error.as_deref())
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}

/// Mark a job synced and drop its queue entry in one transaction.
/// Returns the number of queue rows removed.
pub async fn complete_sync(pool: &SqlitePool, job_id: &str) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE jobs SET synced = 1 WHERE id = ?1")
        .bind(job_id)
        .execute(&mut *tx)
        .await?;

    let removed = sqlx::query("DELETE FROM queued_jobs WHERE id = ?1")
        .bind(job_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;
    Ok(removed)
}
