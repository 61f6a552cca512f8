use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};

use crate::shared::{AppError, AppState};

/// JWT authentication middleware - validates the Authorization Bearer header
/// and adds AuthClaims to the request.
/// Usage: .route_layer(middleware::from_fn_with_state(app_state.clone(), auth::jwt_auth))
/// Handlers can then extract Extension(claims): Extension<AuthClaims>.
///
/// A missing credential is a 401; a credential that fails verification is a 403.
#[instrument(skip(state, req, next), fields(uri = %req.uri()))]
pub async fn jwt_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| {
            warn!("Missing Authorization header in request");
            AppError::Unauthorized("Token not provided".to_string())
        })?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            warn!("Invalid Authorization header format (expected Bearer token)");
            AppError::Unauthorized("Token not provided".to_string())
        })?;

    let claims = state.token_config.validate_token(token).map_err(|e| {
        warn!("JWT authentication failed: {}", e);
        e
    })?;

    debug!(
        user_id = claims.user_id,
        role = %claims.role,
        "Authentication successful, adding claims to request"
    );

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{token::TokenConfig, AuthClaims};
    use crate::shared::test_utils::AppStateBuilder;
    use crate::user::repository::tests::new_user;
    use crate::user::Role;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::get,
        Extension, Router,
    };
    use tower::ServiceExt; // for `oneshot`

    async fn whoami(Extension(claims): Extension<AuthClaims>) -> String {
        format!("{}:{}", claims.user_id, claims.role)
    }

    fn app() -> Router {
        let state = AppStateBuilder::new().build();
        Router::new()
            .route("/me", get(whoami))
            .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth))
            .with_state(state)
    }

    fn request(auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/me");
        if let Some(value) = auth {
            builder = builder.header("Authorization", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let response = app().oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_non_bearer_header_is_unauthorized() {
        let response = app().oneshot(request(Some("Basic abc"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bad_token_is_forbidden() {
        let response = app()
            .oneshot(request(Some("Bearer not.a.jwt")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler_with_claims() {
        let user = new_user("m@example.com", "5", Role::Messenger).into_model(5);
        let token = TokenConfig::default().create_token(&user, false).unwrap();

        let response = app()
            .oneshot(request(Some(&format!("Bearer {token}"))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"5:messenger");
    }
}
