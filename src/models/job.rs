use base64::Engine;
use chrono::{SecondsFormat, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Maximum number of photos attached to a single inspection.
pub const MAX_PHOTOS: usize = 10;

/// Outcome recorded for a unit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq)]
pub enum JobStatus {
    #[serde(rename = "Done")]
    #[strum(serialize = "Done")]
    Done,
    #[serde(rename = "Client Not Available")]
    #[strum(serialize = "Client Not Available")]
    ClientNotAvailable,
    #[serde(rename = "Refused")]
    #[strum(serialize = "Refused")]
    Refused,
    #[serde(rename = "Follow-up Needed")]
    #[strum(serialize = "Follow-up Needed")]
    FollowUpNeeded,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChecklistItem {
    pub id: String,
    pub category: String,
    pub label: String,
    pub checked: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Validate)]
pub struct GpsCoordinates {
    #[garde(custom(finite), range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[garde(custom(finite), range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

/// Rejects NaN and infinities, which serialize as `null`.
fn finite(value: &f64, _ctx: &()) -> garde::Result {
    if value.is_finite() {
        Ok(())
    } else {
        Err(garde::Error::new("must be a finite number"))
    }
}

/// Inspection record for one unit, serialized camelCase so the stored blob
/// and the `POST /engineer/job` body are the same document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[garde(length(min = 1))]
    pub id: String,

    #[garde(skip)]
    pub assignment_id: String,

    #[garde(skip)]
    pub society_name: String,

    #[garde(skip)]
    pub flat_number: String,

    #[garde(skip)]
    pub address: String,

    #[garde(skip)]
    pub checklist: Vec<ChecklistItem>,

    #[garde(skip)]
    pub status: JobStatus,

    #[garde(skip)]
    pub notes: String,

    #[garde(length(max = MAX_PHOTOS))]
    pub photos: Vec<String>,

    /// Signature image URI or `data:` URL. Required before submission.
    #[garde(length(min = 1))]
    pub signature: String,

    #[garde(dive)]
    pub gps_coordinates: GpsCoordinates,

    /// ISO-8601 creation time.
    #[garde(skip)]
    pub timestamp: String,

    #[garde(skip)]
    pub synced: bool,
}

impl Job {
    /// Decode the signature when it is an inline base64 `data:` URL.
    /// Returns the MIME type and raw bytes, or `None` for plain URIs.
    pub fn signature_bytes(&self) -> Option<(String, Vec<u8>)> {
        let rest = self.signature.strip_prefix("data:")?;
        let (meta, payload) = rest.split_once(',')?;
        let mime = meta.strip_suffix(";base64")?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .ok()?;
        Some((mime.to_string(), bytes))
    }
}

/// A job waiting to be sent to the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueuedJob {
    #[serde(flatten)]
    pub job: Job,

    #[serde(default)]
    pub retry_count: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueuedJob {
    pub fn new(job: Job) -> Self {
        Self {
            job,
            retry_count: 0,
            error: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.job.id
    }
}

/// Form input collected on the inspection screen.
#[derive(Debug, Clone)]
pub struct JobDraft {
    pub assignment_id: String,
    pub society_name: String,
    pub flat_number: String,
    pub address: String,
    pub checklist: Vec<ChecklistItem>,
    pub status: JobStatus,
    pub notes: String,
    pub photos: Vec<String>,
    pub signature: String,
    /// `None` when location permission was denied.
    pub location: Option<GpsCoordinates>,
}

impl JobDraft {
    pub fn into_job(self) -> Job {
        Job {
            id: Uuid::new_v4().to_string(),
            assignment_id: self.assignment_id,
            society_name: self.society_name,
            flat_number: self.flat_number,
            address: self.address,
            checklist: self.checklist,
            status: self.status,
            notes: self.notes,
            photos: self.photos,
            signature: self.signature,
            gps_coordinates: self.location.unwrap_or_default(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            synced: false,
        }
    }
}

/// Checklist presented for every new inspection.
pub fn default_checklist() -> Vec<ChecklistItem> {
    [
        ("1", "Electrical", "Main power supply"),
        ("2", "Electrical", "Wiring connections"),
        ("3", "Plumbing", "Water supply"),
        ("4", "Plumbing", "Drainage system"),
        ("5", "Civil", "Wall condition"),
        ("6", "Civil", "Floor finish"),
    ]
    .into_iter()
    .map(|(id, category, label)| ChecklistItem {
        id: id.to_string(),
        category: category.to_string(),
        label: label.to_string(),
        checked: false,
    })
    .collect()
}
