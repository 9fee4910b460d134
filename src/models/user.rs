use garde::Validate;
use serde::{Deserialize, Serialize};

/// The authenticated field engineer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub engineer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_region: Option<String>,
}

/// Bearer token plus the user it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Body of `POST /auth/login`.
#[derive(Debug, Serialize, Validate)]
pub struct LoginRequest {
    #[garde(email)]
    pub email: String,

    #[garde(length(min = 1))]
    pub password: String,
}

/// Response of `POST /auth/login`. Older backends name the user `engineer`.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(alias = "engineer")]
    pub user: User,
}

impl From<LoginResponse> for Session {
    fn from(response: LoginResponse) -> Self {
        Self {
            token: response.token,
            user: response.user,
        }
    }
}
