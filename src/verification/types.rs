use serde::{Deserialize, Serialize};

/// Request payload for POST /api/send-token
#[derive(Debug, Default, Deserialize)]
pub struct SendCodeRequest {
    pub email: Option<String>,
}

/// Response for POST /api/send-token; the code itself travels out-of-band
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SendCodeResponse {
    pub success: bool,
    pub message: String,
    pub expires_in_seconds: i64,
}

/// Request payload for POST /api/verify-token
#[derive(Debug, Default, Deserialize)]
pub struct VerifyCodeRequest {
    pub email: Option<String>,
    pub token: Option<String>,
}

/// Response for POST /api/verify-token
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct VerifyCodeResponse {
    pub success: bool,
    pub message: String,
    pub session_id: String,
}
