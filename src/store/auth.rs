use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::models::user::User;
use crate::services::api::InspectionApi;
use crate::services::auth::{AuthError, AuthService};

#[derive(Debug, Clone)]
pub struct AuthState {
    pub user: Option<User>,
    pub token: Option<String>,
    /// True until the stored session has been read at startup.
    pub is_loading: bool,
    pub is_authenticated: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            user: None,
            token: None,
            is_loading: true,
            is_authenticated: false,
        }
    }
}

/// Session lifecycle: loading, then authenticated or not. Logout and login
/// move between the two; there is no expiry or refresh.
pub struct AuthStore {
    service: AuthService,
    api: Arc<dyn InspectionApi>,
    state: RwLock<AuthState>,
}

impl AuthStore {
    pub fn new(service: AuthService, api: Arc<dyn InspectionApi>) -> Self {
        Self {
            service,
            api,
            state: RwLock::new(AuthState::default()),
        }
    }

    pub async fn snapshot(&self) -> AuthState {
        self.state.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let session = self.service.login(email, password).await?;
        self.api.set_token(Some(session.token.clone()));

        let mut state = self.state.write().await;
        state.token = Some(session.token);
        state.user = Some(session.user);
        state.is_authenticated = true;
        state.is_loading = false;
        Ok(())
    }

    /// Clears memory even when removing the stored keys fails.
    pub async fn logout(&self) {
        if let Err(e) = self.service.logout().await {
            warn!(error = %e, "Failed to clear stored session");
        }
        self.api.set_token(None);

        let mut state = self.state.write().await;
        state.user = None;
        state.token = None;
        state.is_authenticated = false;
        info!("Engineer logged out");
    }

    /// Restore a stored session at startup. Never fails; any storage or
    /// parse problem leaves the store unauthenticated.
    pub async fn load_session(&self) {
        let session = match self.service.load_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Failed to read stored session");
                None
            }
        };

        let mut state = self.state.write().await;
        if let Some(session) = session {
            self.api.set_token(Some(session.token.clone()));
            state.token = Some(session.token);
            state.user = Some(session.user);
            state.is_authenticated = true;
            info!("Stored session restored");
        }
        state.is_loading = false;
    }
}
