use serde::{Deserialize, Serialize};

use crate::user::{Role, UserProfile};

/// JWT claims carried by every issued credential
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthClaims {
    #[serde(rename = "userId")]
    pub user_id: i32,
    pub email: String,
    pub role: Role,
    /// Set when the login was authorized by a verified session instead of
    /// permanent email verification
    pub is_temporary: bool,
    pub exp: usize, // Expiration timestamp (standard JWT claim)
    pub iat: usize, // Issued at timestamp (standard JWT claim)
}

/// Request payload for POST /api/auth/login
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub session_id: Option<String>,
}

/// Response for a successful login
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: UserProfile,
    pub requires_token: bool,
    pub is_temporary: bool,
}

/// Response for GET /api/auth/verify
#[derive(Debug, Serialize, Deserialize)]
pub struct CredentialCheckResponse {
    pub valid: bool,
    pub user: UserProfile,
    pub is_temporary: bool,
}
