use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    token::TokenConfig,
    types::{AuthClaims, CredentialCheckResponse, LoginRequest, LoginResponse},
};
use crate::shared::{required, AppError};
use crate::user::{password::verify_password, UserProfile, UserRepository};
use crate::verification::TokenStore;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Service for credential checks and bearer-token issuance
pub struct AuthService {
    user_repository: Arc<dyn UserRepository + Send + Sync>,
    token_store: Arc<dyn TokenStore + Send + Sync>,
    token_config: TokenConfig,
}

impl AuthService {
    pub fn new(
        user_repository: Arc<dyn UserRepository + Send + Sync>,
        token_store: Arc<dyn TokenStore + Send + Sync>,
        token_config: TokenConfig,
    ) -> Self {
        Self {
            user_repository,
            token_store,
            token_config,
        }
    }

    /// Checks the password, then the email-verification gate.
    ///
    /// An unverified account may still sign in by presenting a verified
    /// session minted for the same email; the session is used up by the login
    /// and the issued credential is marked temporary.
    #[instrument(skip(self, request))]
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError> {
        let email = required(request.email);
        let password = request.password.filter(|p| !p.is_empty());
        let (email, password) = match (email, password) {
            (Some(email), Some(password)) => (email, password),
            _ => {
                return Err(AppError::Validation(
                    "Email and password are required".to_string(),
                ))
            }
        };

        let user = match self.user_repository.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                warn!(email = %email, "Login for unknown email");
                return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
        };

        if !verify_password(&user, password).await? {
            warn!(user_id = user.id, "Login with wrong password");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let is_temporary = if user.is_email_verified {
            false
        } else {
            let redeemed = match required(request.session_id) {
                Some(session_id) => self.token_store.redeem_session(&session_id, &email).await?,
                None => false,
            };
            if !redeemed {
                warn!(user_id = user.id, "Unverified account without a verified session");
                return Err(AppError::EmailNotVerified);
            }
            info!(user_id = user.id, "Signing in with a verified session");
            true
        };

        let token = self.token_config.create_token(&user, is_temporary)?;
        info!(user_id = user.id, role = %user.role, is_temporary, "Login successful");

        Ok(LoginResponse {
            success: true,
            message: "Login successful".to_string(),
            token,
            user: UserProfile::from(&user),
            requires_token: false,
            is_temporary,
        })
    }

    /// Resolves the account behind an already-validated credential
    #[instrument(skip(self, claims), fields(user_id = claims.user_id))]
    pub async fn current_user(
        &self,
        claims: &AuthClaims,
    ) -> Result<CredentialCheckResponse, AppError> {
        let user = self
            .user_repository
            .get_user(claims.user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

        Ok(CredentialCheckResponse {
            valid: true,
            user: UserProfile::from(&user),
            is_temporary: claims.is_temporary,
        })
    }
}
