use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Target the app runs on. `Web` has no local database.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Native,
    Web,
}

impl Platform {
    pub fn has_local_storage(self) -> bool {
        matches!(self, Platform::Native)
    }
}

/// How credentials are checked at login.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// `POST /auth/login` against the backend.
    #[default]
    Remote,
    /// Hardcoded demo credential, no network.
    Demo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// SQLite connection string for the local job store
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Backend base URL (e.g., "http://192.168.1.5:4000")
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// JSON file backing the session key-value storage
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,

    #[serde(default)]
    pub platform: Platform,

    #[serde(default)]
    pub auth_mode: AuthMode,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_database_url() -> String {
    "sqlite://field_inspector.db".to_string()
}

fn default_api_base_url() -> String {
    "http://localhost:4000".to_string()
}

fn default_session_file() -> PathBuf {
    PathBuf::from("field_inspector_session.json")
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
