use async_trait::async_trait;
use garde::Validate;
use std::sync::Arc;
use tracing::{info, warn};

use crate::models::user::{LoginRequest, Session, User};
use crate::services::api::{ApiError, InspectionApi};
use crate::services::session::{KeyValueStorage, StorageError, AUTH_TOKEN_KEY, USER_KEY};

pub const DEMO_EMAIL: &str = "demo@engineer.com";
pub const DEMO_PASSWORD: &str = "demo123";

/// Checks credentials and produces a session.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Session, AuthError>;
}

/// Credentials checked by the backend.
pub struct RemoteAuthenticator {
    api: Arc<dyn InspectionApi>,
}

impl RemoteAuthenticator {
    pub fn new(api: Arc<dyn InspectionApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Authenticator for RemoteAuthenticator {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        request
            .validate()
            .map_err(|report| AuthError::InvalidInput(report.to_string()))?;

        match self.api.login(&request).await {
            Ok(response) => Ok(response.into()),
            Err(ApiError::Status { status, message }) if status == 400 || status == 401 => {
                Err(AuthError::Rejected(message))
            }
            Err(e) => Err(AuthError::Api(e)),
        }
    }
}

/// Offline demo login with a single hardcoded credential.
#[derive(Default)]
pub struct DemoAuthenticator;

impl DemoAuthenticator {
    fn demo_user() -> User {
        User {
            id: "demo".to_string(),
            name: "Demo Engineer".to_string(),
            email: DEMO_EMAIL.to_string(),
            engineer_id: "ENG-DEMO".to_string(),
            assigned_region: Some("Mumbai".to_string()),
        }
    }
}

#[async_trait]
impl Authenticator for DemoAuthenticator {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        if email.trim() == DEMO_EMAIL && password == DEMO_PASSWORD {
            Ok(Session {
                token: "demo-token".to_string(),
                user: Self::demo_user(),
            })
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// Login, logout and session persistence.
pub struct AuthService {
    authenticator: Arc<dyn Authenticator>,
    storage: Arc<dyn KeyValueStorage>,
}

impl AuthService {
    pub fn new(authenticator: Arc<dyn Authenticator>, storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            authenticator,
            storage,
        }
    }

    /// Authenticate and persist `{token, user}`.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let session = self.authenticator.authenticate(email, password).await?;

        let user_json = serde_json::to_string(&session.user)
            .map_err(|e| AuthError::Storage(StorageError::Serialize(e)))?;
        self.storage.set_item(AUTH_TOKEN_KEY, &session.token).await?;
        self.storage.set_item(USER_KEY, &user_json).await?;

        info!(user_id = %session.user.id, "Engineer logged in");
        Ok(session)
    }

    /// Remove both session keys. Both removals are attempted.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let token = self.storage.remove_item(AUTH_TOKEN_KEY).await;
        let user = self.storage.remove_item(USER_KEY).await;
        token?;
        user?;
        Ok(())
    }

    /// Read the stored session. A missing key or an unparsable user yields `None`.
    pub async fn load_session(&self) -> Result<Option<Session>, AuthError> {
        let token = self.storage.get_item(AUTH_TOKEN_KEY).await?;
        let user_json = self.storage.get_item(USER_KEY).await?;

        let (Some(token), Some(user_json)) = (token, user_json) else {
            return Ok(None);
        };

        match serde_json::from_str::<User>(&user_json) {
            Ok(user) => Ok(Some(Session { token, user })),
            Err(e) => {
                warn!(error = %e, "Stored user is unreadable, ignoring session");
                Ok(None)
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Server-provided rejection message.
    #[error("{0}")]
    Rejected(String),

    #[error("Invalid login details: {0}")]
    InvalidInput(String),

    #[error("Login failed: {0}")]
    Api(#[from] ApiError),

    #[error("Session storage error: {0}")]
    Storage(#[from] StorageError),
}
