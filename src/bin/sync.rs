use field_inspector::{app_state::AppState, config::AppConfig};
use tracing_subscriber::EnvFilter;

/// Flush the sync queue once: one upload attempt per queued job.
#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting queue sync");

    let config = AppConfig::from_env().expect("Failed to load configuration");
    let state = AppState::from_config(&config).expect("Failed to initialize API client");
    state.bootstrap().await;

    if !state.auth.is_authenticated().await {
        tracing::error!("No stored session, log in before syncing");
        std::process::exit(1);
    }

    if !state.jobs.snapshot().await.db_ready {
        tracing::error!("Database not ready, nothing to sync");
        std::process::exit(1);
    }

    match state.sync_queue.retry_all().await {
        Ok(report) => {
            tracing::info!(
                synced = report.synced.len(),
                failed = report.failed.len(),
                "Sync pass complete"
            );
            if !report.failed.is_empty() {
                std::process::exit(2);
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Sync pass aborted");
            std::process::exit(1);
        }
    }
}
