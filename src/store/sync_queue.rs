use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::models::job::{Job, QueuedJob};
use crate::services::api::{ApiError, InspectionApi};
use crate::services::connectivity::ConnectivityMonitor;
use crate::store::jobs::{JobStore, StoreError};

/// What the sync queue screen shows.
#[derive(Debug, Clone)]
pub struct QueueOverview {
    pub queued_jobs: Vec<QueuedJob>,
    pub online: bool,
}

/// Result of one pass over the queue.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub synced: Vec<String>,
    pub failed: Vec<String>,
}

/// Control boundary behind the sync queue screen: list, delete, retry.
///
/// A retry is one attempt, made only when the operator asks for it. There is
/// no scheduler and no backoff.
pub struct SyncQueue {
    jobs: Arc<JobStore>,
    api: Arc<dyn InspectionApi>,
    connectivity: Arc<ConnectivityMonitor>,
}

impl SyncQueue {
    pub fn new(
        jobs: Arc<JobStore>,
        api: Arc<dyn InspectionApi>,
        connectivity: Arc<ConnectivityMonitor>,
    ) -> Self {
        Self {
            jobs,
            api,
            connectivity,
        }
    }

    pub async fn overview(&self) -> QueueOverview {
        QueueOverview {
            queued_jobs: self.jobs.snapshot().await.queued_jobs,
            online: self.connectivity.is_online(),
        }
    }

    pub async fn delete(&self, job_id: &str) -> Result<(), SyncError> {
        self.jobs.remove_from_queue(job_id).await?;
        info!(job_id = %job_id, "Queued job deleted by operator");
        Ok(())
    }

    /// Send one queued job to the backend. On failure the retry count and
    /// error message are recorded and the failure is returned.
    pub async fn retry(&self, job_id: &str) -> Result<(), SyncError> {
        if !self.connectivity.is_online() {
            return Err(SyncError::Offline);
        }

        let queued = self
            .jobs
            .queued_job(job_id)
            .await
            .ok_or_else(|| SyncError::NotQueued(job_id.to_string()))?;

        match self.send(&queued.job).await {
            Ok(()) => {
                self.jobs.mark_synced(job_id).await?;
                info!(job_id = %job_id, "Job synced");
                Ok(())
            }
            Err(e) => match self.jobs.record_sync_failure(job_id, &e.to_string()).await {
                Ok(retry_count) => {
                    warn!(job_id = %job_id, retry_count, error = %e, "Sync attempt failed");
                    Err(e)
                }
                Err(store_error) => {
                    error!(
                        job_id = %job_id,
                        error = %e,
                        store_error = %store_error,
                        "Sync attempt failed and could not be recorded"
                    );
                    Err(store_error.into())
                }
            },
        }
    }

    /// One attempt per queued job, oldest first. A store failure stops the
    /// pass; the jobs handled before it are carried in `SyncError::Interrupted`.
    pub async fn retry_all(&self) -> Result<SyncReport, SyncError> {
        if !self.connectivity.is_online() {
            return Err(SyncError::Offline);
        }

        let mut ids: Vec<String> = self
            .jobs
            .snapshot()
            .await
            .queued_jobs
            .iter()
            .map(|q| q.id().to_string())
            .collect();
        ids.reverse();

        let mut report = SyncReport::default();
        for id in ids {
            match self.retry(&id).await {
                Ok(()) => report.synced.push(id),
                Err(SyncError::Store(source)) => {
                    return Err(SyncError::Interrupted {
                        report,
                        source,
                    })
                }
                Err(_) => report.failed.push(id),
            }
        }
        Ok(report)
    }

    /// Upload attachments, then post the job with their remote URLs.
    async fn send(&self, job: &Job) -> Result<(), SyncError> {
        let mut outgoing = job.clone();

        for (index, photo) in outgoing.photos.iter_mut().enumerate() {
            if let Some(path) = photo.strip_prefix("file://") {
                let bytes = tokio::fs::read(path).await?;
                let filename = format!("{}-photo-{}{}", job.id, index, extension(path));
                *photo = self
                    .api
                    .upload_file(&filename, bytes, content_type(path))
                    .await?;
            }
        }

        if let Some((mime, bytes)) = job.signature_bytes() {
            let filename = format!("{}-signature{}", job.id, mime_extension(&mime));
            outgoing.signature = self.api.upload_file(&filename, bytes, &mime).await?;
        }

        self.api.upload_job(&outgoing).await?;
        Ok(())
    }
}

fn extension(path: &str) -> String {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}

fn mime_extension(mime: &str) -> &'static str {
    match mime {
        "image/png" => ".png",
        "image/jpeg" => ".jpg",
        "image/heic" => ".heic",
        "image/svg+xml" => ".svg",
        _ => "",
    }
}

fn content_type(path: &str) -> &'static str {
    match extension(path).as_str() {
        ".png" => "image/png",
        ".jpg" | ".jpeg" => "image/jpeg",
        ".heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Device is offline")]
    Offline,

    #[error("Job {0} is not queued")]
    NotQueued(String),

    #[error("Upload failed: {0}")]
    Upload(#[from] ApiError),

    #[error("Could not read attachment: {0}")]
    Attachment(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Sync stopped after {} synced, {} failed: {source}", report.synced.len(), report.failed.len())]
    Interrupted {
        report: SyncReport,
        #[source]
        source: StoreError,
    },
}
