use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

use parcel_tracker::{
    user::{models::NewUser, password::hash_password, UserModel},
    Role, UserRepository,
};

use super::setup::{TestSetup, TEST_BCRYPT_COST};

// ============================================================================
// Action Helpers
// ============================================================================

/// Status and decoded JSON body of one request
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl TestSetup {
    /// Send a request through the full router
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> ApiResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        ApiResponse {
            status,
            body,
            content_type,
            bytes,
        }
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> ApiResponse {
        self.send("POST", uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> ApiResponse {
        self.send("PUT", uri, token, Some(body)).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> ApiResponse {
        self.send("GET", uri, token, None).await
    }

    // ============================================================================
    // Convenience Action Methods
    // ============================================================================

    /// Insert a user directly, bypassing the registration endpoint
    pub async fn seed_user(
        &self,
        email: &str,
        document: &str,
        role: Role,
        verified: bool,
        password: &str,
    ) -> UserModel {
        let hash = hash_password(password.to_string(), TEST_BCRYPT_COST)
            .await
            .unwrap();
        self.users
            .create_user(&NewUser {
                first_name: "Test".to_string(),
                second_name: None,
                last_name: role.to_string(),
                second_last_name: None,
                document_number: document.to_string(),
                email: email.to_string(),
                address: "Calle 1".to_string(),
                phone: "3000000000".to_string(),
                role,
                is_email_verified: verified,
                password_hash: Some(hash),
            })
            .await
            .unwrap()
    }

    /// Issue a credential without going through login
    pub fn token_for(&self, user: &UserModel) -> String {
        self.token_config.create_token(user, false).unwrap()
    }

    /// Register a client through the API
    pub async fn register_client(&self, email: &str, document: &str, password: &str) -> ApiResponse {
        self.post(
            "/api/auth/register",
            None,
            json!({
                "first_name": "Ana",
                "last_name": "Mora",
                "document_number": document,
                "email": email,
                "address": "Calle 1",
                "phone": "3000000000",
                "password": password
            }),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str, session_id: Option<&str>) -> ApiResponse {
        let mut body = json!({ "email": email, "password": password });
        if let Some(session_id) = session_id {
            body["session_id"] = json!(session_id);
        }
        self.post("/api/auth/login", None, body).await
    }

    /// Request a code, read it from the notifier, and exchange it for a session id
    pub async fn verified_session_for(&self, email: &str) -> String {
        let sent = self.post("/api/send-token", None, json!({ "email": email })).await;
        assert_eq!(sent.status, StatusCode::OK);

        let code = self.notifier.last_code_for(email).await.unwrap();
        let verified = self
            .post(
                "/api/verify-token",
                None,
                json!({ "email": email, "token": code }),
            )
            .await;
        assert_eq!(verified.status, StatusCode::OK);

        verified.body["session_id"].as_str().unwrap().to_string()
    }

    /// Register a package through the API
    pub async fn register_package(&self, client_id: i32, weight: Option<f64>) -> ApiResponse {
        let mut body = json!({
            "sender_name": "A",
            "recipient_name": "B",
            "delivery_address": "X",
            "client_id": client_id
        });
        if let Some(weight) = weight {
            body["weight"] = json!(weight);
        }
        self.post("/api/packages/register", None, body).await
    }
}
