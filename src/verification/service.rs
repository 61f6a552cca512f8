use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    notifier::CodeNotifier,
    store::TokenStore,
    types::{SendCodeRequest, SendCodeResponse, VerifyCodeRequest, VerifyCodeResponse},
};
use crate::shared::{required, AppError};

/// Service for the two-step email verification flow
pub struct VerificationService {
    store: Arc<dyn TokenStore + Send + Sync>,
    notifier: Arc<dyn CodeNotifier>,
}

impl VerificationService {
    pub fn new(store: Arc<dyn TokenStore + Send + Sync>, notifier: Arc<dyn CodeNotifier>) -> Self {
        Self { store, notifier }
    }

    /// Issues a code for the email and hands it to the notifier
    #[instrument(skip(self, request))]
    pub async fn send_code(&self, request: SendCodeRequest) -> Result<SendCodeResponse, AppError> {
        let email = required(request.email)
            .ok_or_else(|| AppError::Validation("Email is required".to_string()))?;

        let code = self.store.issue_code(&email).await?;
        self.notifier.deliver(&code).await?;

        let expires_in_seconds = (code.expires_at - chrono::Utc::now()).num_seconds().max(0);
        info!(email = %email, expires_in_seconds, "Verification code sent");

        Ok(SendCodeResponse {
            success: true,
            message: "Verification code generated".to_string(),
            expires_in_seconds,
        })
    }

    /// Trades a correct code for a verified-session id
    #[instrument(skip(self, request))]
    pub async fn verify_code(
        &self,
        request: VerifyCodeRequest,
    ) -> Result<VerifyCodeResponse, AppError> {
        let (email, token) = match (required(request.email), required(request.token)) {
            (Some(email), Some(token)) => (email, token),
            _ => {
                return Err(AppError::Validation(
                    "Email and token are required".to_string(),
                ))
            }
        };

        let session = self.store.consume_code(&email, &token).await.map_err(|e| {
            warn!(email = %email, reason = %e, "Verification code rejected");
            AppError::from(e)
        })?;

        info!(email = %email, "Email verified with one-time code");

        Ok(VerifyCodeResponse {
            success: true,
            message: "Code verified. You can now sign in.".to_string(),
            session_id: session.id,
        })
    }
}
