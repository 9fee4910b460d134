//! Test helpers: an in-process mock of the inspection backend and store wiring.

#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use field_inspector::config::Platform;
use field_inspector::services::api::{ApiClient, InspectionApi};
use field_inspector::services::repository::{JobRepository, SqliteJobRepository};
use field_inspector::store::jobs::JobStore;

pub const TOKEN: &str = "backend-token";

/// Everything the mock backend has received.
#[derive(Default)]
pub struct BackendRecord {
    pub jobs: Mutex<Vec<Value>>,
    pub uploads: Mutex<HashMap<String, Vec<u8>>>,
    pub auth_headers: Mutex<Vec<Option<String>>>,
    /// When set, `POST /engineer/job` answers 503.
    pub fail_jobs: AtomicBool,
}

impl BackendRecord {
    pub fn set_failing(&self, failing: bool) {
        self.fail_jobs.store(failing, Ordering::SeqCst);
    }

    pub fn received_jobs(&self) -> Vec<Value> {
        self.jobs.lock().unwrap().clone()
    }
}

#[derive(Clone)]
struct Backend {
    base_url: String,
    record: Arc<BackendRecord>,
}

pub struct MockBackend {
    pub base_url: String,
    pub record: Arc<BackendRecord>,
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["email"] == "demo@engineer.com" && body["password"] == "demo123" {
        (
            StatusCode::OK,
            Json(json!({
                "token": TOKEN,
                "engineer": {
                    "id": "e-1",
                    "name": "Asha Rao",
                    "email": "demo@engineer.com",
                    "engineerId": "ENG-001",
                    "assignedRegion": "Pune"
                }
            })),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid email or password" })),
        )
    }
}

async fn assignments(State(backend): State<Backend>, headers: HeaderMap) -> Json<Value> {
    backend.record.auth_headers.lock().unwrap().push(bearer(&headers));
    Json(json!([{
        "id": "42",
        "societyName": "Lake View Residency",
        "flatNumbers": ["L-1", "L-2"],
        "address": "9 Lake Road, Nashik",
        "urgency": "low",
        "status": "pending"
    }]))
}

async fn jobs(State(backend): State<Backend>) -> Json<Value> {
    let received = backend.record.jobs.lock().unwrap().clone();
    Json(Value::Array(received))
}

async fn submit_job(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(job): Json<Value>,
) -> (StatusCode, Json<Value>) {
    backend.record.auth_headers.lock().unwrap().push(bearer(&headers));
    if backend.record.fail_jobs.load(Ordering::SeqCst) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "message": "Backend unavailable" })),
        );
    }
    backend.record.jobs.lock().unwrap().push(job);
    (StatusCode::OK, Json(json!({ "ok": true })))
}

async fn presigned(State(backend): State<Backend>, Json(body): Json<Value>) -> Json<Value> {
    let filename = body["filename"].as_str().unwrap_or("unnamed");
    Json(json!({ "url": format!("{}/uploads/{}", backend.base_url, filename) }))
}

async fn put_upload(
    State(backend): State<Backend>,
    Path(filename): Path<String>,
    body: Bytes,
) -> StatusCode {
    backend
        .record
        .uploads
        .lock()
        .unwrap()
        .insert(filename, body.to_vec());
    StatusCode::OK
}

/// Start the mock backend on an ephemeral port.
pub async fn spawn_backend() -> MockBackend {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let record = Arc::new(BackendRecord::default());

    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/engineer/assignments", get(assignments))
        .route("/engineer/jobs", get(jobs))
        .route("/engineer/job", post(submit_job))
        .route("/upload/presigned", post(presigned))
        .route("/uploads/{filename}", put(put_upload))
        .with_state(Backend {
            base_url: base_url.clone(),
            record: record.clone(),
        });

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend { base_url, record }
}

pub fn api_client(base_url: &str) -> Arc<ApiClient> {
    Arc::new(ApiClient::new(base_url, Duration::from_secs(5)).unwrap())
}

/// Client pointed at a port nothing listens on.
pub fn unreachable_api() -> Arc<ApiClient> {
    Arc::new(ApiClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap())
}

pub async fn memory_repository() -> Arc<SqliteJobRepository> {
    let repository = Arc::new(SqliteJobRepository::new("sqlite::memory:"));
    repository.initialize().await.unwrap();
    repository
}

/// Native job store over an initialized in-memory database, gate open.
pub async fn ready_store(api: Arc<dyn InspectionApi>) -> (Arc<JobStore>, Arc<SqliteJobRepository>) {
    let repository = memory_repository().await;
    let store = Arc::new(JobStore::new(repository.clone(), api, Platform::Native));
    store.set_db_ready(true).await;
    (store, repository)
}
