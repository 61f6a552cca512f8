use async_trait::async_trait;
use tracing::info;

use super::models::VerificationCode;
use crate::shared::AppError;

/// Out-of-band delivery of verification codes (email, SMS, ...)
#[async_trait]
pub trait CodeNotifier: Send + Sync {
    async fn deliver(&self, code: &VerificationCode) -> Result<(), AppError>;
}

/// Writes the code to the server log; stands in for a mail transport
pub struct LoggingCodeNotifier;

#[async_trait]
impl CodeNotifier for LoggingCodeNotifier {
    async fn deliver(&self, code: &VerificationCode) -> Result<(), AppError> {
        info!(
            email = %code.email,
            code = %code.code,
            expires_at = %code.expires_at,
            "Verification code generated"
        );
        Ok(())
    }
}
