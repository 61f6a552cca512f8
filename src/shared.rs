use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use strum::IntoEnumIterator;
use thiserror::Error;
use tracing::error;

use crate::auth::TokenConfig;
use crate::config::ServiceSettings;
use crate::package::{PackageRepository, PackageStatus};
use crate::user::UserRepository;
use crate::verification::{CodeNotifier, TokenStore};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub package_repository: Arc<dyn PackageRepository + Send + Sync>,
    pub token_store: Arc<dyn TokenStore + Send + Sync>,
    pub notifier: Arc<dyn CodeNotifier>,
    pub token_config: TokenConfig,
    pub settings: ServiceSettings,
}

impl AppState {
    pub fn new(
        user_repository: Arc<dyn UserRepository + Send + Sync>,
        package_repository: Arc<dyn PackageRepository + Send + Sync>,
        token_store: Arc<dyn TokenStore + Send + Sync>,
        notifier: Arc<dyn CodeNotifier>,
        token_config: TokenConfig,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            user_repository,
            package_repository,
            token_store,
            notifier,
            token_config,
            settings,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Email not verified")]
    EmailNotVerified,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::InvalidStatus(_) => {
                let valid_statuses: Vec<String> =
                    PackageStatus::iter().map(|s| s.to_string()).collect();
                (
                    StatusCode::BAD_REQUEST,
                    json!({
                        "error": "Invalid status",
                        "valid_statuses": valid_statuses
                    }),
                )
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            AppError::InvalidToken(msg) | AppError::Forbidden(msg) => {
                (StatusCode::FORBIDDEN, json!({ "error": msg }))
            }
            AppError::EmailNotVerified => (
                StatusCode::FORBIDDEN,
                json!({
                    "error": "Email not verified",
                    "code": "EMAIL_NOT_VERIFIED",
                    "requires_token": true,
                    "message": "Verify your email with a one-time code to sign in"
                }),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            AppError::DatabaseError(msg) => {
                error!(error = %msg, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
            AppError::Internal(msg) => {
                error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// JSON body extractor whose rejections render as `AppError`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path extractor whose rejections render as `AppError`
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Trims a wire field and treats blank values as absent
pub fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
