mod fixtures;
mod helpers;

use std::sync::Arc;

use async_trait::async_trait;
use field_inspector::config::Platform;
use field_inspector::models::job::{Job, QueuedJob};
use field_inspector::services::connectivity::ConnectivityMonitor;
use field_inspector::services::repository::{JobRepository, RepositoryError, SqliteJobRepository};
use field_inspector::store::jobs::{JobStore, StoreError};
use field_inspector::store::sync_queue::{SyncError, SyncQueue};

/// SQLite repository whose retry bookkeeping writes always fail.
struct RetryWritesFail {
    inner: Arc<SqliteJobRepository>,
}

#[async_trait]
impl JobRepository for RetryWritesFail {
    async fn initialize(&self) -> Result<(), RepositoryError> {
        self.inner.initialize().await
    }

    async fn save_job(&self, job: &Job) -> Result<(), RepositoryError> {
        self.inner.save_job(job).await
    }

    async fn get_all_jobs(&self) -> Result<Vec<Job>, RepositoryError> {
        self.inner.get_all_jobs().await
    }

    async fn get_job(&self, job_id: &str) -> Result<Option<Job>, RepositoryError> {
        self.inner.get_job(job_id).await
    }

    async fn update_job_sync_status(
        &self,
        job_id: &str,
        synced: bool,
    ) -> Result<(), RepositoryError> {
        self.inner.update_job_sync_status(job_id, synced).await
    }

    async fn delete_job(&self, job_id: &str) -> Result<(), RepositoryError> {
        self.inner.delete_job(job_id).await
    }

    async fn add_job_to_queue(&self, queued: &QueuedJob) -> Result<(), RepositoryError> {
        self.inner.add_job_to_queue(queued).await
    }

    async fn get_queued_jobs(&self) -> Result<Vec<QueuedJob>, RepositoryError> {
        self.inner.get_queued_jobs().await
    }

    async fn remove_job_from_queue(&self, job_id: &str) -> Result<(), RepositoryError> {
        self.inner.remove_job_from_queue(job_id).await
    }

    async fn update_queued_job_retry(
        &self,
        _job_id: &str,
        _retry_count: u32,
        _error: Option<&str>,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::NotInitialized)
    }

    async fn clear_queue(&self) -> Result<(), RepositoryError> {
        self.inner.clear_queue().await
    }

    async fn record_submission(&self, job: &Job) -> Result<QueuedJob, RepositoryError> {
        self.inner.record_submission(job).await
    }

    async fn complete_sync(&self, job_id: &str) -> Result<(), RepositoryError> {
        self.inner.complete_sync(job_id).await
    }
}

#[tokio::test]
async fn test_retry_uploads_and_dequeues() {
    let backend = helpers::spawn_backend().await;
    let api = helpers::api_client(&backend.base_url);
    let (store, repository) = helpers::ready_store(api.clone()).await;
    let queue = SyncQueue::new(store.clone(), api, Arc::new(ConnectivityMonitor::default()));

    let queued = store.submit_job(fixtures::job("A-101")).await.unwrap();
    queue.retry(queued.id()).await.unwrap();

    assert!(queue.overview().await.queued_jobs.is_empty());
    assert!(repository.get_queued_jobs().await.unwrap().is_empty());
    assert!(repository.get_job(queued.id()).await.unwrap().unwrap().synced);
    assert!(store.snapshot().await.jobs[0].synced);

    let received = backend.record.received_jobs();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0]["id"], queued.id());
    let signature = received[0]["signature"].as_str().unwrap();
    assert!(signature.starts_with(&backend.base_url));
    assert!(backend
        .record
        .uploads
        .lock()
        .unwrap()
        .contains_key(&format!("{}-signature.png", queued.id())));
}

#[tokio::test]
async fn test_signature_filename_follows_mime_type() {
    let backend = helpers::spawn_backend().await;
    let api = helpers::api_client(&backend.base_url);
    let (store, _repository) = helpers::ready_store(api.clone()).await;
    let queue = SyncQueue::new(store.clone(), api, Arc::new(ConnectivityMonitor::default()));

    let mut job = fixtures::job("A-101");
    job.signature = "data:image/jpeg;base64,aGVsbG8=".to_string();
    let queued = store.submit_job(job).await.unwrap();

    queue.retry(queued.id()).await.unwrap();

    let uploads = backend.record.uploads.lock().unwrap();
    assert_eq!(
        uploads.get(&format!("{}-signature.jpg", queued.id())).map(Vec::as_slice),
        Some(&b"hello"[..])
    );
    assert!(!uploads.contains_key(&format!("{}-signature.png", queued.id())));
}

#[tokio::test]
async fn test_retry_uploads_local_photos() {
    let backend = helpers::spawn_backend().await;
    let api = helpers::api_client(&backend.base_url);
    let (store, _repository) = helpers::ready_store(api.clone()).await;
    let queue = SyncQueue::new(store.clone(), api, Arc::new(ConnectivityMonitor::default()));

    let dir = tempfile::tempdir().unwrap();
    let photo_path = dir.path().join("meter.jpg");
    std::fs::write(&photo_path, b"jpeg-bytes").unwrap();

    let mut job = fixtures::job("A-102");
    job.photos = vec![
        format!("file://{}", photo_path.display()),
        "https://cdn.example.com/already-uploaded.jpg".to_string(),
    ];
    let queued = store.submit_job(job).await.unwrap();

    queue.retry(queued.id()).await.unwrap();

    let received = backend.record.received_jobs();
    let photos = received[0]["photos"].as_array().unwrap();
    assert_eq!(
        photos[0].as_str().unwrap(),
        format!("{}/uploads/{}-photo-0.jpg", backend.base_url, queued.id())
    );
    assert_eq!(photos[1], "https://cdn.example.com/already-uploaded.jpg");

    let uploads = backend.record.uploads.lock().unwrap();
    assert_eq!(
        uploads.get(&format!("{}-photo-0.jpg", queued.id())).map(Vec::as_slice),
        Some(&b"jpeg-bytes"[..])
    );
}

#[tokio::test]
async fn test_failed_retry_records_bookkeeping() {
    let backend = helpers::spawn_backend().await;
    backend.record.set_failing(true);
    let api = helpers::api_client(&backend.base_url);
    let (store, repository) = helpers::ready_store(api.clone()).await;
    let queue = SyncQueue::new(store.clone(), api, Arc::new(ConnectivityMonitor::default()));

    let queued = store.submit_job(fixtures::job("A-101")).await.unwrap();

    let err = queue.retry(queued.id()).await.unwrap_err();
    assert!(matches!(err, SyncError::Upload(_)));
    queue.retry(queued.id()).await.unwrap_err();

    let in_memory = store.queued_job(queued.id()).await.unwrap();
    assert_eq!(in_memory.retry_count, 2);
    assert_eq!(
        in_memory.error.as_deref(),
        Some("Upload failed: Backend unavailable")
    );

    let persisted = &repository.get_queued_jobs().await.unwrap()[0];
    assert_eq!(persisted.retry_count, 2);
    assert!(!repository.get_job(queued.id()).await.unwrap().unwrap().synced);

    backend.record.set_failing(false);
    queue.retry(queued.id()).await.unwrap();
    assert!(store.queued_job(queued.id()).await.is_none());
}

#[tokio::test]
async fn test_retry_refused_while_offline() {
    let backend = helpers::spawn_backend().await;
    let api = helpers::api_client(&backend.base_url);
    let (store, _repository) = helpers::ready_store(api.clone()).await;
    let connectivity = Arc::new(ConnectivityMonitor::new(false));
    let queue = SyncQueue::new(store.clone(), api, connectivity.clone());

    let queued = store.submit_job(fixtures::job("A-101")).await.unwrap();

    assert!(matches!(queue.retry(queued.id()).await, Err(SyncError::Offline)));
    assert!(matches!(queue.retry_all().await, Err(SyncError::Offline)));
    assert!(!queue.overview().await.online);
    assert!(backend.record.received_jobs().is_empty());
    assert_eq!(store.queued_job(queued.id()).await.unwrap().retry_count, 0);

    connectivity.set_online(true);
    queue.retry(queued.id()).await.unwrap();
}

#[tokio::test]
async fn test_retry_unknown_job() {
    let (store, _repository) = helpers::ready_store(helpers::unreachable_api()).await;
    let queue = SyncQueue::new(
        store,
        helpers::unreachable_api(),
        Arc::new(ConnectivityMonitor::default()),
    );
    assert!(matches!(
        queue.retry("missing").await,
        Err(SyncError::NotQueued(id)) if id == "missing"
    ));
}

#[tokio::test]
async fn test_delete_removes_from_queue_only() {
    let (store, repository) = helpers::ready_store(helpers::unreachable_api()).await;
    let queue = SyncQueue::new(
        store.clone(),
        helpers::unreachable_api(),
        Arc::new(ConnectivityMonitor::default()),
    );
    let queued = store.submit_job(fixtures::job("A-101")).await.unwrap();

    queue.delete(queued.id()).await.unwrap();

    assert!(queue.overview().await.queued_jobs.is_empty());
    assert!(repository.get_queued_jobs().await.unwrap().is_empty());
    assert!(repository.get_job(queued.id()).await.unwrap().is_some());
}

#[tokio::test]
async fn test_retry_all_reports_each_job() {
    let backend = helpers::spawn_backend().await;
    let api = helpers::api_client(&backend.base_url);
    let (store, _repository) = helpers::ready_store(api.clone()).await;
    let queue = SyncQueue::new(store.clone(), api, Arc::new(ConnectivityMonitor::default()));

    let first = store.submit_job(fixtures::job("A-101")).await.unwrap();
    let mut broken = fixtures::job("A-102");
    broken.photos = vec!["file:///definitely/not/here.jpg".to_string()];
    let second = store.submit_job(broken).await.unwrap();

    let report = queue.retry_all().await.unwrap();
    assert_eq!(report.synced, vec![first.id().to_string()]);
    assert_eq!(report.failed, vec![second.id().to_string()]);

    let remaining = queue.overview().await.queued_jobs;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].retry_count, 1);
    assert!(remaining[0].error.as_deref().unwrap().starts_with("Could not read attachment"));
}

#[tokio::test]
async fn test_unrecorded_failure_returns_store_error() {
    let backend = helpers::spawn_backend().await;
    backend.record.set_failing(true);
    let api = helpers::api_client(&backend.base_url);
    let repository = Arc::new(RetryWritesFail {
        inner: helpers::memory_repository().await,
    });
    let store = Arc::new(JobStore::new(repository, api.clone(), Platform::Native));
    store.set_db_ready(true).await;
    let queue = SyncQueue::new(store.clone(), api, Arc::new(ConnectivityMonitor::default()));

    let queued = store.submit_job(fixtures::job("A-101")).await.unwrap();

    let err = queue.retry(queued.id()).await.unwrap_err();
    assert!(matches!(err, SyncError::Store(StoreError::Repository(_))));
    assert_eq!(store.queued_job(queued.id()).await.unwrap().retry_count, 0);
}

#[tokio::test]
async fn test_retry_all_keeps_progress_when_interrupted() {
    let backend = helpers::spawn_backend().await;
    let api = helpers::api_client(&backend.base_url);
    let repository = Arc::new(RetryWritesFail {
        inner: helpers::memory_repository().await,
    });
    let store = Arc::new(JobStore::new(repository, api.clone(), Platform::Native));
    store.set_db_ready(true).await;
    let queue = SyncQueue::new(store.clone(), api, Arc::new(ConnectivityMonitor::default()));

    let first = store.submit_job(fixtures::job("A-101")).await.unwrap();
    let mut broken = fixtures::job("A-102");
    broken.photos = vec!["file:///definitely/not/here.jpg".to_string()];
    let second = store.submit_job(broken).await.unwrap();

    match queue.retry_all().await {
        Err(SyncError::Interrupted { report, source }) => {
            assert_eq!(report.synced, vec![first.id().to_string()]);
            assert!(report.failed.is_empty());
            assert!(matches!(source, StoreError::Repository(_)));
        }
        other => panic!("expected interrupted pass, got {other:?}"),
    }

    let remaining = queue.overview().await.queued_jobs;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id(), second.id());
}
