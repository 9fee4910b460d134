use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Work-duration timer for the inspection in progress. Not persisted.
#[derive(Default)]
pub struct WorkTimer {
    started_at: Mutex<Option<Instant>>,
}

impl WorkTimer {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Instant>> {
        match self.started_at.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Start (or restart) the timer.
    pub fn start(&self) {
        *self.slot() = Some(Instant::now());
    }

    /// Stop and return the elapsed time, or `None` if it was not running.
    pub fn stop(&self) -> Option<Duration> {
        self.slot().take().map(|started| started.elapsed())
    }

    pub fn is_running(&self) -> bool {
        self.slot().is_some()
    }

    pub fn elapsed(&self) -> Option<Duration> {
        let started = *self.slot();
        started.map(|started| started.elapsed())
    }
}

/// `MM:SS` as shown in the screen header. Minutes are not capped at 59.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
