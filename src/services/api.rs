use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use std::time::Duration;
use tracing::debug;

use crate::models::assignment::Assignment;
use crate::models::job::Job;
use crate::models::user::{LoginRequest, LoginResponse};

/// Backend operations used by the app.
#[async_trait]
pub trait InspectionApi: Send + Sync {
    /// `POST /auth/login`
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError>;

    /// `GET /engineer/assignments`
    async fn get_assignments(&self) -> Result<Vec<Assignment>, ApiError>;

    /// `GET /engineer/jobs`
    async fn get_jobs(&self) -> Result<Vec<Job>, ApiError>;

    /// `POST /engineer/job`
    async fn upload_job(&self, job: &Job) -> Result<(), ApiError>;

    /// Presigned upload: `POST /upload/presigned` then `PUT` the bytes.
    /// Returns the URL the file now lives at.
    async fn upload_file(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ApiError>;

    /// Bearer token attached to subsequent requests.
    fn set_token(&self, token: Option<String>);
}

/// HTTP client for the inspection backend.
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

#[derive(Serialize)]
struct PresignedRequest<'a> {
    filename: &'a str,
}

#[derive(Deserialize)]
struct PresignedResponse {
    url: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Http)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let token = self.token.read().ok().and_then(|t| t.clone());
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Turn a non-2xx response into `ApiError::Status`, preferring the
    /// backend's JSON `message` over the bare status text.
    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or_else(|_| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });

        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl InspectionApi for ApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(request)
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    async fn get_assignments(&self) -> Result<Vec<Assignment>, ApiError> {
        let response = self
            .authorize(self.http.get(self.url("/engineer/assignments")))
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    async fn get_jobs(&self) -> Result<Vec<Job>, ApiError> {
        let response = self
            .authorize(self.http.get(self.url("/engineer/jobs")))
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    async fn upload_job(&self, job: &Job) -> Result<(), ApiError> {
        let response = self
            .authorize(self.http.post(self.url("/engineer/job")))
            .json(job)
            .send()
            .await?;

        Self::check(response).await?;
        debug!(job_id = %job.id, "Job uploaded");
        Ok(())
    }

    async fn upload_file(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ApiError> {
        let response = self
            .authorize(self.http.post(self.url("/upload/presigned")))
            .json(&PresignedRequest { filename })
            .send()
            .await?;
        let presigned: PresignedResponse = Self::check(response).await?.json().await?;

        let size = bytes.len();
        let response = self
            .http
            .put(&presigned.url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;
        Self::check(response).await?;

        debug!(filename, size, "File uploaded");
        Ok(presigned.url)
    }

    fn set_token(&self, token: Option<String>) {
        if let Ok(mut slot) = self.token.write() {
            *slot = token;
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Status { status: u16, message: String },
}
