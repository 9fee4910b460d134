use garde::Validate;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::config::Platform;
use crate::models::assignment::{mock_assignments, Assignment};
use crate::models::job::{Job, QueuedJob};
use crate::services::api::{ApiError, InspectionApi};
use crate::services::repository::{JobRepository, RepositoryError};

/// Snapshot of the job container, as the UI reads it.
#[derive(Debug, Clone, Default)]
pub struct JobState {
    pub assignments: Vec<Assignment>,
    pub jobs: Vec<Job>,
    pub queued_jobs: Vec<QueuedJob>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub db_ready: bool,
}

/// In-memory source of truth for jobs and the sync queue, hydrated from the
/// repository once the database is ready.
///
/// Every mutation writes the repository first and touches memory only after
/// the write succeeded.
pub struct JobStore {
    repository: Arc<dyn JobRepository>,
    api: Arc<dyn InspectionApi>,
    platform: Platform,
    state: RwLock<JobState>,
}

/// Whether a call should go to the repository.
enum Persistence {
    Enabled,
    /// Platform without local storage: memory only.
    Skipped,
}

impl JobStore {
    pub fn new(
        repository: Arc<dyn JobRepository>,
        api: Arc<dyn InspectionApi>,
        platform: Platform,
    ) -> Self {
        Self {
            repository,
            api,
            platform,
            state: RwLock::new(JobState::default()),
        }
    }

    pub async fn snapshot(&self) -> JobState {
        self.state.read().await.clone()
    }

    pub async fn queued_job(&self, job_id: &str) -> Option<QueuedJob> {
        self.state
            .read()
            .await
            .queued_jobs
            .iter()
            .find(|q| q.id() == job_id)
            .cloned()
    }

    /// Open the database and flip the readiness gate. A failure is returned
    /// and leaves the gate closed.
    pub async fn initialize_database(&self) -> Result<(), StoreError> {
        if !self.platform.has_local_storage() {
            return Ok(());
        }
        self.repository.initialize().await?;
        self.set_db_ready(true).await;
        Ok(())
    }

    /// One-way gate: once open it stays open for the life of the store.
    pub async fn set_db_ready(&self, ready: bool) {
        let mut state = self.state.write().await;
        if state.db_ready && !ready {
            warn!("Ignoring attempt to close the database readiness gate");
            return;
        }
        state.db_ready = ready;
    }

    async fn persistence(&self) -> Result<Persistence, StoreError> {
        if !self.platform.has_local_storage() {
            return Ok(Persistence::Skipped);
        }
        let mut state = self.state.write().await;
        if state.db_ready {
            Ok(Persistence::Enabled)
        } else {
            state.error = Some(StoreError::NotReady.to_string());
            Err(StoreError::NotReady)
        }
    }

    async fn set_error(&self, error: &StoreError) {
        self.state.write().await.error = Some(error.to_string());
    }

    /// Assignments from the backend, or the static list when it cannot be
    /// reached (and always on `web`).
    pub async fn fetch_assignments(&self) {
        self.state.write().await.is_loading = true;

        let assignments = if self.platform.has_local_storage() {
            match self.api.get_assignments().await {
                Ok(assignments) => assignments,
                Err(e) => {
                    warn!(error = %e, "Assignment fetch failed, using built-in assignments");
                    mock_assignments()
                }
            }
        } else {
            mock_assignments()
        };

        let mut state = self.state.write().await;
        state.assignments = assignments;
        state.is_loading = false;
    }

    /// Replace the job list with the backend's copy.
    pub async fn fetch_jobs(&self) -> Result<(), StoreError> {
        self.state.write().await.is_loading = true;

        let result = self.api.get_jobs().await;
        let mut state = self.state.write().await;
        state.is_loading = false;
        match result {
            Ok(jobs) => {
                state.jobs = jobs;
                Ok(())
            }
            Err(e) => {
                let err = StoreError::Api(e);
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn load_jobs_from_database(&self) -> Result<(), StoreError> {
        let Persistence::Enabled = self.persistence().await? else {
            return Ok(());
        };

        self.state.write().await.is_loading = true;
        let result = self.repository.get_all_jobs().await;

        let mut state = self.state.write().await;
        state.is_loading = false;
        match result {
            Ok(jobs) => {
                info!(count = jobs.len(), "Jobs loaded from database");
                state.jobs = jobs;
                state.error = None;
                Ok(())
            }
            Err(e) => {
                let err = StoreError::Repository(e);
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn load_queued_jobs_from_database(&self) -> Result<(), StoreError> {
        let Persistence::Enabled = self.persistence().await? else {
            return Ok(());
        };

        let result = self.repository.get_queued_jobs().await;

        let mut state = self.state.write().await;
        match result {
            Ok(queued) => {
                info!(count = queued.len(), "Queued jobs loaded from database");
                state.queued_jobs = queued;
                Ok(())
            }
            Err(e) => {
                let err = StoreError::Repository(e);
                state.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Persist a job and put it at the front of the list.
    pub async fn add_job(&self, job: Job) -> Result<(), StoreError> {
        if let Persistence::Enabled = self.persistence().await? {
            if let Err(e) = self.repository.save_job(&job).await {
                let err = StoreError::Repository(e);
                error!(job_id = %job.id, error = %err, "Failed to save job");
                self.set_error(&err).await;
                return Err(err);
            }
        }

        self.state.write().await.jobs.insert(0, job);
        Ok(())
    }

    pub async fn add_to_queue(&self, queued: QueuedJob) -> Result<(), StoreError> {
        if let Persistence::Enabled = self.persistence().await? {
            if let Err(e) = self.repository.add_job_to_queue(&queued).await {
                let err = StoreError::Repository(e);
                self.set_error(&err).await;
                return Err(err);
            }
        }

        self.state.write().await.queued_jobs.insert(0, queued);
        Ok(())
    }

    pub async fn remove_from_queue(&self, job_id: &str) -> Result<(), StoreError> {
        if let Persistence::Enabled = self.persistence().await? {
            if let Err(e) = self.repository.remove_job_from_queue(job_id).await {
                let err = StoreError::Repository(e);
                self.set_error(&err).await;
                return Err(err);
            }
        }

        self.state
            .write()
            .await
            .queued_jobs
            .retain(|q| q.id() != job_id);
        Ok(())
    }

    /// Overwrite retry bookkeeping for a queued job.
    pub async fn update_queued_job(
        &self,
        job_id: &str,
        retry_count: u32,
        error: Option<String>,
    ) -> Result<(), StoreError> {
        if let Persistence::Enabled = self.persistence().await? {
            if let Err(e) = self
                .repository
                .update_queued_job_retry(job_id, retry_count, error.as_deref())
                .await
            {
                let err = StoreError::Repository(e);
                self.set_error(&err).await;
                return Err(err);
            }
        }

        let mut state = self.state.write().await;
        if let Some(queued) = state.queued_jobs.iter_mut().find(|q| q.id() == job_id) {
            queued.retry_count = retry_count;
            queued.error = error;
        }
        Ok(())
    }

    /// Validate a finished inspection, then record the job and its queue
    /// entry together. Nothing is written when validation fails.
    pub async fn submit_job(&self, job: Job) -> Result<QueuedJob, StoreError> {
        job.validate()
            .map_err(|report| StoreError::Validation(report.to_string()))?;

        let queued = match self.persistence().await? {
            Persistence::Enabled => match self.repository.record_submission(&job).await {
                Ok(queued) => queued,
                Err(e) => {
                    let err = StoreError::Repository(e);
                    error!(job_id = %job.id, error = %err, "Failed to record submission");
                    self.set_error(&err).await;
                    return Err(err);
                }
            },
            Persistence::Skipped => QueuedJob::new(job.clone()),
        };

        let mut state = self.state.write().await;
        state.jobs.insert(0, job);
        state.queued_jobs.insert(0, queued.clone());
        info!(job_id = %queued.id(), "Inspection queued for sync");
        Ok(queued)
    }

    /// Mark a job synced and drop it from the queue.
    pub async fn mark_synced(&self, job_id: &str) -> Result<(), StoreError> {
        if let Persistence::Enabled = self.persistence().await? {
            if let Err(e) = self.repository.complete_sync(job_id).await {
                let err = StoreError::Repository(e);
                self.set_error(&err).await;
                return Err(err);
            }
        }

        let mut state = self.state.write().await;
        state.queued_jobs.retain(|q| q.id() != job_id);
        if let Some(job) = state.jobs.iter_mut().find(|j| j.id == job_id) {
            job.synced = true;
        }
        Ok(())
    }

    /// Count a failed sync attempt against a queued job.
    /// Returns the new retry count.
    pub async fn record_sync_failure(&self, job_id: &str, message: &str) -> Result<u32, StoreError> {
        let queued = self
            .queued_job(job_id)
            .await
            .ok_or_else(|| StoreError::NotQueued(job_id.to_string()))?;
        let retry_count = queued.retry_count + 1;

        self.update_queued_job(job_id, retry_count, Some(message.to_string()))
            .await?;
        Ok(retry_count)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database not ready")]
    NotReady,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Job {0} is not queued")]
    NotQueued(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Api(#[from] ApiError),
}
