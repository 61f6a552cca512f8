use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    service::UserService,
    types::{CreateUserRequest, ListUsersQuery, UserCreatedResponse, UserProfile},
};
use crate::auth::AuthClaims;
use crate::shared::{ApiJson, ApiQuery, AppError, AppState};

fn require_staff(claims: &AuthClaims) -> Result<(), AppError> {
    if claims.role.is_staff() {
        Ok(())
    } else {
        warn!(user_id = claims.user_id, role = %claims.role, "Non-staff caller on staff endpoint");
        Err(AppError::Forbidden(
            "Only operators and admins can manage users".to_string(),
        ))
    }
}

/// HTTP handler for creating a staff-managed account
///
/// POST /api/users
#[instrument(name = "create_user", skip(state, claims, request))]
pub async fn create_user(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserCreatedResponse>), AppError> {
    require_staff(&claims)?;

    let service = UserService::new(
        Arc::clone(&state.user_repository),
        state.settings.bcrypt_cost,
    );
    let user = service.create_user(request).await?;

    info!(created_by = claims.user_id, user_id = user.id, role = %user.role, "User created");

    Ok((
        StatusCode::CREATED,
        Json(UserCreatedResponse {
            message: "User created successfully".to_string(),
            user,
        }),
    ))
}

/// HTTP handler for listing users, optionally filtered by role
///
/// GET /api/users?role=messenger
#[instrument(name = "list_users", skip(state, claims))]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    ApiQuery(query): ApiQuery<ListUsersQuery>,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    require_staff(&claims)?;

    let service = UserService::new(
        Arc::clone(&state.user_repository),
        state.settings.bcrypt_cost,
    );
    let users = service.list_users(query.role.as_deref()).await?;

    Ok(Json(users))
}
