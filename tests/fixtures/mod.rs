//! Sample inspection records.

#![allow(dead_code)]

use field_inspector::models::job::{
    default_checklist, GpsCoordinates, Job, JobDraft, JobStatus, QueuedJob,
};

/// 1x1 transparent PNG.
pub const SIGNATURE_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

pub fn draft(society: &str, flat: &str) -> JobDraft {
    JobDraft {
        assignment_id: "1".to_string(),
        society_name: society.to_string(),
        flat_number: flat.to_string(),
        address: "123 Main Street, Mumbai".to_string(),
        checklist: default_checklist(),
        status: JobStatus::Done,
        notes: "Meter box replaced".to_string(),
        photos: vec![],
        signature: SIGNATURE_DATA_URL.to_string(),
        location: Some(GpsCoordinates {
            latitude: 19.076,
            longitude: 72.8777,
        }),
    }
}

pub fn job(flat: &str) -> Job {
    draft("Green Valley Apartments", flat).into_job()
}

pub fn queued(flat: &str) -> QueuedJob {
    QueuedJob::new(job(flat))
}
