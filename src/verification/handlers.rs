use axum::{extract::State, Json};
use std::sync::Arc;
use tracing::instrument;

use super::{
    service::VerificationService,
    types::{SendCodeRequest, SendCodeResponse, VerifyCodeRequest, VerifyCodeResponse},
};
use crate::shared::{ApiJson, AppError, AppState};

/// HTTP handler for issuing a one-time verification code
///
/// POST /api/send-token
#[instrument(name = "send_token", skip(state, request))]
pub async fn send_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SendCodeRequest>,
) -> Result<Json<SendCodeResponse>, AppError> {
    let service = VerificationService::new(
        Arc::clone(&state.token_store),
        Arc::clone(&state.notifier),
    );
    Ok(Json(service.send_code(request).await?))
}

/// HTTP handler for exchanging a code for a verified session
///
/// POST /api/verify-token
#[instrument(name = "verify_token", skip(state, request))]
pub async fn verify_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VerifyCodeRequest>,
) -> Result<Json<VerifyCodeResponse>, AppError> {
    let service = VerificationService::new(
        Arc::clone(&state.token_store),
        Arc::clone(&state.notifier),
    );
    Ok(Json(service.verify_code(request).await?))
}
