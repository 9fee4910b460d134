use field_inspector::{app_state::AppState, config::AppConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!(
        platform = ?config.platform,
        auth_mode = ?config.auth_mode,
        "Starting field-inspector"
    );

    let state = AppState::from_config(&config).expect("Failed to initialize API client");
    state.bootstrap().await;

    let auth = state.auth.snapshot().await;
    if !auth.is_authenticated {
        tracing::info!("No stored session, engineer must log in");
        return;
    }

    state.jobs.fetch_assignments().await;

    let jobs = state.jobs.snapshot().await;
    tracing::info!(
        engineer = auth.user.as_ref().map(|u| u.name.as_str()).unwrap_or_default(),
        db_ready = jobs.db_ready,
        assignments = jobs.assignments.len(),
        jobs = jobs.jobs.len(),
        queued = jobs.queued_jobs.len(),
        "Status"
    );

    for queued in &jobs.queued_jobs {
        tracing::info!(
            job_id = %queued.id(),
            society = %queued.job.society_name,
            flat = %queued.job.flat_number,
            retry_count = queued.retry_count,
            error = queued.error.as_deref().unwrap_or_default(),
            "Pending sync"
        );
    }
}
