use std::sync::Arc;
use tracing::{error, info};

use crate::config::{AppConfig, AuthMode, Platform};
use crate::services::{
    api::{ApiClient, ApiError, InspectionApi},
    auth::{AuthService, Authenticator, DemoAuthenticator, RemoteAuthenticator},
    connectivity::ConnectivityMonitor,
    repository::{JobRepository, SqliteJobRepository},
    session::{FileStorage, KeyValueStorage, MemoryStorage},
};
use crate::store::{
    auth::AuthStore, completion::FlatCompletionTracker, jobs::JobStore, sync_queue::SyncQueue,
    timer::WorkTimer,
};

/// All state containers, wired to their collaborators.
#[derive(Clone)]
pub struct AppState {
    pub platform: Platform,
    pub auth: Arc<AuthStore>,
    pub jobs: Arc<JobStore>,
    pub sync_queue: Arc<SyncQueue>,
    pub connectivity: Arc<ConnectivityMonitor>,
    pub completion: Arc<FlatCompletionTracker>,
    pub timer: Arc<WorkTimer>,
}

impl AppState {
    pub fn new(
        platform: Platform,
        repository: Arc<dyn JobRepository>,
        api: Arc<dyn InspectionApi>,
        authenticator: Arc<dyn Authenticator>,
        storage: Arc<dyn KeyValueStorage>,
    ) -> Self {
        let connectivity = Arc::new(ConnectivityMonitor::default());
        let jobs = Arc::new(JobStore::new(repository, api.clone(), platform));
        let auth = Arc::new(AuthStore::new(
            AuthService::new(authenticator, storage),
            api.clone(),
        ));
        let sync_queue = Arc::new(SyncQueue::new(jobs.clone(), api, connectivity.clone()));

        Self {
            platform,
            auth,
            jobs,
            sync_queue,
            connectivity,
            completion: Arc::new(FlatCompletionTracker::new()),
            timer: Arc::new(WorkTimer::new()),
        }
    }

    /// Production wiring from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        let api: Arc<dyn InspectionApi> =
            Arc::new(ApiClient::new(&config.api_base_url, config.request_timeout())?);

        let authenticator: Arc<dyn Authenticator> = match config.auth_mode {
            AuthMode::Remote => Arc::new(RemoteAuthenticator::new(api.clone())),
            AuthMode::Demo => Arc::new(DemoAuthenticator),
        };

        let storage: Arc<dyn KeyValueStorage> = match config.platform {
            Platform::Native => Arc::new(FileStorage::new(&config.session_file)),
            Platform::Web => Arc::new(MemoryStorage::new()),
        };

        let repository = Arc::new(SqliteJobRepository::new(config.database_url.clone()));

        Ok(Self::new(
            config.platform,
            repository,
            api,
            authenticator,
            storage,
        ))
    }

    /// Startup sequence: restore the session, then on native targets open
    /// the database and hydrate jobs and the queue. A database failure is
    /// logged and leaves the readiness gate closed.
    pub async fn bootstrap(&self) {
        self.auth.load_session().await;

        if !self.platform.has_local_storage() {
            return;
        }

        if let Err(e) = self.jobs.initialize_database().await {
            error!(error = %e, "Database initialization failed");
            return;
        }
        if let Err(e) = self.jobs.load_jobs_from_database().await {
            error!(error = %e, "Failed to load jobs");
        }
        if let Err(e) = self.jobs.load_queued_jobs_from_database().await {
            error!(error = %e, "Failed to load queued jobs");
        }

        info!("Bootstrap complete");
    }
}
