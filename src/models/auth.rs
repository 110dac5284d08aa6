use serde::{Deserialize, Serialize};

use super::user::Role;

/// Claims embedded in the JWT access token issued by the operational system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub role: Role,
    #[serde(default)]
    pub club_id: Option<i64>,
    #[serde(default)]
    pub ptso: Option<String>,
    pub exp: usize,
    pub iat: usize,
}

/// Extracted from the validated JWT, available via Axum extractors
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub role: Role,
    pub club_id: Option<i64>,
    pub ptso: Option<String>,
}
