use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;
use tracing::instrument;

use super::{
    models::PackageModel,
    service::PackageService,
    types::{
        AssignMessengerRequest, MessengerAssignedResponse, PackageCreatedResponse, PackageView,
        RegisterPackageRequest, StatusUpdatedResponse, TrackingResponse, UpdateStatusRequest,
    },
};
use crate::auth::AuthClaims;
use crate::shared::{ApiJson, ApiPath, AppError, AppState};

fn package_service(state: &AppState) -> PackageService {
    PackageService::new(
        Arc::clone(&state.package_repository),
        Arc::clone(&state.user_repository),
        state.settings.tracking_base_url.clone(),
    )
}

/// POST /api/packages/register
#[instrument(name = "register_package", skip(state, request))]
pub async fn register_package(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterPackageRequest>,
) -> Result<(StatusCode, Json<PackageCreatedResponse>), AppError> {
    let package = package_service(&state).register_package(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(PackageCreatedResponse {
            message: "Package registered successfully".to_string(),
            package,
        }),
    ))
}

/// GET /api/packages
#[instrument(name = "list_packages", skip(state))]
pub async fn list_packages(
    State(state): State<AppState>,
) -> Result<Json<Vec<PackageView>>, AppError> {
    Ok(Json(package_service(&state).list_packages().await?))
}

/// GET /api/packages/tracking/:tracking_code
#[instrument(name = "track_package", skip(state))]
pub async fn track_package(
    State(state): State<AppState>,
    ApiPath(tracking_code): ApiPath<String>,
) -> Result<Json<TrackingResponse>, AppError> {
    Ok(Json(package_service(&state).track(&tracking_code).await?))
}

/// PUT /api/packages/:id/status
#[instrument(name = "update_status", skip(state, claims, request))]
pub async fn update_status(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
    ApiPath(package_id): ApiPath<i32>,
    ApiJson(request): ApiJson<UpdateStatusRequest>,
) -> Result<Json<StatusUpdatedResponse>, AppError> {
    let package = package_service(&state)
        .update_status(package_id, request, &claims)
        .await?;

    Ok(Json(StatusUpdatedResponse {
        message: "Status updated successfully".to_string(),
        package: (&package).into(),
    }))
}

/// PUT /api/packages/:id/assign-messenger
#[instrument(name = "assign_messenger", skip(state, request))]
pub async fn assign_messenger(
    State(state): State<AppState>,
    ApiPath(package_id): ApiPath<i32>,
    ApiJson(request): ApiJson<AssignMessengerRequest>,
) -> Result<Json<MessengerAssignedResponse>, AppError> {
    let package = package_service(&state)
        .assign_messenger(package_id, request)
        .await?;

    Ok(Json(MessengerAssignedResponse {
        message: "Messenger assigned successfully".to_string(),
        package: (&package).into(),
    }))
}

/// GET /api/packages/messenger/my-deliveries
#[instrument(name = "my_deliveries", skip(state, claims))]
pub async fn my_deliveries(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
) -> Result<Json<Vec<PackageView>>, AppError> {
    Ok(Json(package_service(&state).my_deliveries(&claims).await?))
}

/// GET /api/packages/client/my-packages
#[instrument(name = "my_packages", skip(state, claims))]
pub async fn my_packages(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
) -> Result<Json<Vec<PackageModel>>, AppError> {
    Ok(Json(package_service(&state).my_packages(&claims).await?))
}

/// GET /api/packages/:id/qr
#[instrument(name = "package_qr", skip(state))]
pub async fn package_qr(
    State(state): State<AppState>,
    ApiPath(package_id): ApiPath<i32>,
) -> Result<impl IntoResponse, AppError> {
    let png = package_service(&state).qr_code(package_id).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
