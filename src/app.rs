use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::shared::AppState;
use crate::{auth, package, user, verification};

/// Builds the HTTP surface. Routes needing a bearer credential sit behind
/// `jwt_auth`; everything else is public.
pub fn build_router(state: AppState, cors_origin: Option<&str>) -> Router {
    let protected = Router::new()
        .route("/api/auth/verify", get(auth::verify))
        .route("/api/users", post(user::create_user).get(user::list_users))
        .route("/api/packages/:id/status", put(package::update_status))
        .route(
            "/api/packages/messenger/my-deliveries",
            get(package::my_deliveries),
        )
        .route("/api/packages/client/my-packages", get(package::my_packages))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::jwt_auth));

    let public = Router::new()
        .route("/", get(banner))
        .route("/api/health", get(health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/send-token", post(verification::send_token))
        .route("/api/verify-token", post(verification::verify_token))
        .route("/api/packages", get(package::list_packages))
        .route("/api/packages/register", post(package::register_package))
        .route(
            "/api/packages/tracking/:tracking_code",
            get(package::track_package),
        )
        .route(
            "/api/packages/:id/assign-messenger",
            put(package::assign_messenger),
        )
        .route("/api/packages/:id/qr", get(package::package_qr));

    let mut router = public
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if let Some(origin) = cors_origin {
        router = router.layer(cors_layer(origin));
    }
    router
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    match HeaderValue::from_str(origin) {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            warn!(origin = %origin, "Invalid CORS origin, cross-origin requests will be refused");
            layer
        }
    }
}

async fn banner() -> Json<Value> {
    Json(json!({
        "message": "Parcel tracking API",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "storage": state.settings.storage.as_str()
    }))
}
