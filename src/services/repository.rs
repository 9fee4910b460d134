use async_trait::async_trait;
use sqlx::SqlitePool;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::db::{self, queries};
use crate::models::job::{Job, QueuedJob};

/// Durable storage for finished jobs and the pending-sync queue.
///
/// Single-statement operations are not coupled: a queue entry may outlive
/// the job row it was created with. `record_submission` and `complete_sync`
/// are the two operations that span both tables, and each runs in one
/// transaction.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Create the tables. Must succeed before any other call.
    async fn initialize(&self) -> Result<(), RepositoryError>;

    async fn save_job(&self, job: &Job) -> Result<(), RepositoryError>;

    /// Newest first, with the `synced` column overlaid on each record.
    async fn get_all_jobs(&self) -> Result<Vec<Job>, RepositoryError>;

    async fn get_job(&self, job_id: &str) -> Result<Option<Job>, RepositoryError>;

    /// No-op when the id is absent.
    async fn update_job_sync_status(&self, job_id: &str, synced: bool)
        -> Result<(), RepositoryError>;

    async fn delete_job(&self, job_id: &str) -> Result<(), RepositoryError>;

    async fn add_job_to_queue(&self, queued: &QueuedJob) -> Result<(), RepositoryError>;

    /// Newest first, with `retry_count` and `error` columns overlaid.
    async fn get_queued_jobs(&self) -> Result<Vec<QueuedJob>, RepositoryError>;

    async fn remove_job_from_queue(&self, job_id: &str) -> Result<(), RepositoryError>;

    async fn update_queued_job_retry(
        &self,
        job_id: &str,
        retry_count: u32,
        error: Option<&str>,
    ) -> Result<(), RepositoryError>;

    async fn clear_queue(&self) -> Result<(), RepositoryError>;

    /// Persist a new job together with its queue entry (`retry_count = 0`).
    async fn record_submission(&self, job: &Job) -> Result<QueuedJob, RepositoryError>;

    /// Mark the job synced and remove it from the queue.
    async fn complete_sync(&self, job_id: &str) -> Result<(), RepositoryError>;
}

/// SQLite-backed repository. The pool is opened by `initialize`.
pub struct SqliteJobRepository {
    database_url: String,
    pool: OnceCell<SqlitePool>,
}

impl SqliteJobRepository {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            pool: OnceCell::new(),
        }
    }

    fn pool(&self) -> Result<&SqlitePool, RepositoryError> {
        self.pool.get().ok_or(RepositoryError::NotInitialized)
    }
}

fn decode_job(row: queries::JobRow) -> Option<Job> {
    match serde_json::from_str::<Job>(&row.data) {
        Ok(mut job) => {
            job.synced = row.synced;
            Some(job)
        }
        Err(e) => {
            warn!(job_id = %row.id, error = %e, "Skipping unreadable job record");
            None
        }
    }
}

fn decode_queued_job(row: queries::QueuedJobRow) -> Option<QueuedJob> {
    match serde_json::from_str::<QueuedJob>(&row.data) {
        Ok(mut queued) => {
            queued.retry_count = row.retry_count.max(0) as u32;
            queued.error = row.error;
            Some(queued)
        }
        Err(e) => {
            warn!(job_id = %row.id, error = %e, "Skipping unreadable queue record");
            None
        }
    }
}

fn map_insert_error(job_id: &str, e: sqlx::Error) -> RepositoryError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            RepositoryError::AlreadyQueued(job_id.to_string())
        }
        _ => RepositoryError::Database(e),
    }
}

#[async_trait]
impl JobRepository for SqliteJobRepository {
    async fn initialize(&self) -> Result<(), RepositoryError> {
        self.pool
            .get_or_try_init(|| async {
                let pool = db::init_pool(&self.database_url).await?;
                db::create_schema(&pool).await?;
                Ok::<_, sqlx::Error>(pool)
            })
            .await?;

        info!(database_url = %self.database_url, "Job database initialized");
        Ok(())
    }

    async fn save_job(&self, job: &Job) -> Result<(), RepositoryError> {
        let pool = self.pool()?;
        let data = serde_json::to_string(job)?;
        queries::upsert_job(pool, job, &data).await?;
        debug!(job_id = %job.id, "Job saved");
        Ok(())
    }

    async fn get_all_jobs(&self) -> Result<Vec<Job>, RepositoryError> {
        let rows = queries::list_jobs(self.pool()?).await?;
        Ok(rows.into_iter().filter_map(decode_job).collect())
    }

    async fn get_job(&self, job_id: &str) -> Result<Option<Job>, RepositoryError> {
        let row = queries::get_job(self.pool()?, job_id).await?;
        Ok(row.and_then(decode_job))
    }

    async fn update_job_sync_status(
        &self,
        job_id: &str,
        synced: bool,
    ) -> Result<(), RepositoryError> {
        let touched = queries::update_job_synced(self.pool()?, job_id, synced).await?;
        if touched == 0 {
            debug!(job_id = %job_id, "Sync status update matched no job");
        }
        Ok(())
    }

    async fn delete_job(&self, job_id: &str) -> Result<(), RepositoryError> {
        queries::delete_job(self.pool()?, job_id).await?;
        Ok(())
    }

    async fn add_job_to_queue(&self, queued: &QueuedJob) -> Result<(), RepositoryError> {
        let pool = self.pool()?;
        let data = serde_json::to_string(queued)?;
        queries::insert_queued_job(pool, queued, &data)
            .await
            .map_err(|e| map_insert_error(queued.id(), e))?;
        debug!(job_id = %queued.id(), "Job queued");
        Ok(())
    }

    async fn get_queued_jobs(&self) -> Result<Vec<QueuedJob>, RepositoryError> {
        let rows = queries::list_queued_jobs(self.pool()?).await?;
        Ok(rows.into_iter().filter_map(decode_queued_job).collect())
    }

    async fn remove_job_from_queue(&self, job_id: &str) -> Result<(), RepositoryError> {
        queries::delete_queued_job(self.pool()?, job_id).await?;
        debug!(job_id = %job_id, "Queued job removed");
        Ok(())
    }

    async fn update_queued_job_retry(
        &self,
        job_id: &str,
        retry_count: u32,
        error: Option<&str>,
    ) -> Result<(), RepositoryError> {
        queries::update_queued_retry(self.pool()?, job_id, retry_count, error).await?;
        Ok(())
    }

    async fn clear_queue(&self) -> Result<(), RepositoryError> {
        let removed = queries::clear_queued_jobs(self.pool()?).await?;
        info!(removed, "Sync queue cleared");
        Ok(())
    }

    async fn record_submission(&self, job: &Job) -> Result<QueuedJob, RepositoryError> {
        let pool = self.pool()?;
        let queued = QueuedJob::new(job.clone());
        let job_data = serde_json::to_string(job)?;
        let queued_data = serde_json::to_string(&queued)?;

        queries::insert_submission(pool, job, &job_data, &queued, &queued_data)
            .await
            .map_err(|e| map_insert_error(&job.id, e))?;

        info!(job_id = %job.id, "Submission recorded");
        Ok(queued)
    }

    async fn complete_sync(&self, job_id: &str) -> Result<(), RepositoryError> {
        let removed = queries::complete_sync(self.pool()?, job_id).await?;
        debug!(job_id = %job_id, removed, "Sync completed");
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database not initialized")]
    NotInitialized,

    #[error("Job {0} is already queued")]
    AlreadyQueued(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
