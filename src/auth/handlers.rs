use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::AuthService,
    types::{AuthClaims, CredentialCheckResponse, LoginRequest, LoginResponse},
};
use crate::shared::{ApiJson, AppError, AppState};
use crate::user::{
    service::UserService,
    types::{RegisterRequest, UserCreatedResponse},
};

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(
        Arc::clone(&state.user_repository),
        Arc::clone(&state.token_store),
        state.token_config.clone(),
    )
}

/// HTTP handler for client self-registration
///
/// POST /api/auth/register
#[instrument(name = "register", skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserCreatedResponse>), AppError> {
    let service = UserService::new(
        Arc::clone(&state.user_repository),
        state.settings.bcrypt_cost,
    );
    let user = service.register_client(request).await?;

    info!(user_id = user.id, "Client registered");

    Ok((
        StatusCode::CREATED,
        Json(UserCreatedResponse {
            message: "Client registered successfully".to_string(),
            user,
        }),
    ))
}

/// HTTP handler for password login
///
/// POST /api/auth/login
#[instrument(name = "login", skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    Ok(Json(auth_service(&state).login(request).await?))
}

/// HTTP handler for checking a bearer credential
///
/// GET /api/auth/verify
#[instrument(name = "verify", skip(state, claims))]
pub async fn verify(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
) -> Result<Json<CredentialCheckResponse>, AppError> {
    Ok(Json(auth_service(&state).current_user(&claims).await?))
}

/// Credentials are stateless, so logging out is the client dropping its token
///
/// POST /api/auth/logout
pub async fn logout() -> Json<LogoutResponse> {
    Json(LogoutResponse {
        message: "Logout successful".to_string(),
    })
}
