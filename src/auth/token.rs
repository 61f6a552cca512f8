use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, instrument};

use super::types::AuthClaims;
use crate::shared::AppError;
use crate::user::UserModel;

const TEST_SECRET: &str = "parcel-tracker-test-secret";

/// Signing configuration for bearer credentials
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
    pub expiration_hours: i64,
}

impl TokenConfig {
    pub fn new(secret: String, expiration_hours: i64) -> Self {
        Self {
            secret,
            expiration_hours,
        }
    }

    /// Issues a signed credential for the user
    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub fn create_token(&self, user: &UserModel, is_temporary: bool) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = (now + Duration::hours(self.expiration_hours)).timestamp() as usize;

        debug!(
            expiration_hours = self.expiration_hours,
            exp_timestamp = exp,
            is_temporary,
            "Creating JWT token with expiration"
        );

        let claims = AuthClaims {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
            is_temporary,
            exp,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to sign JWT: {e}")))
    }

    /// Validates signature and expiry, returning the claims
    #[instrument(skip(self, token))]
    pub fn validate_token(&self, token: &str) -> Result<AuthClaims, AppError> {
        decode::<AuthClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map(|data| {
            debug!(
                user_id = data.claims.user_id,
                role = %data.claims.role,
                exp = data.claims.exp,
                "JWT token decoded successfully"
            );
            data.claims
        })
        .map_err(|e| {
            debug!(error = %e, "Failed to decode JWT token");
            AppError::InvalidToken("Invalid or expired token".to_string())
        })
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self::new(TEST_SECRET.to_string(), 24)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::repository::tests::new_user;
    use crate::user::Role;

    fn user() -> UserModel {
        new_user("ana@example.com", "1037", Role::Operator).into_model(42)
    }

    #[test]
    fn test_create_and_validate_token() {
        let config = TokenConfig::default();

        let token = config.create_token(&user(), false).unwrap();
        assert!(!token.is_empty());

        let claims = config.validate_token(&token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.email, "ana@example.com");
        assert_eq!(claims.role, Role::Operator);
        assert!(!claims.is_temporary);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_temporary_flag_round_trips() {
        let config = TokenConfig::default();
        let token = config.create_token(&user(), true).unwrap();
        assert!(config.validate_token(&token).unwrap().is_temporary);
    }

    #[test]
    fn test_invalid_token() {
        let config = TokenConfig::default();
        let result = config.validate_token("invalid.token.here");
        assert!(matches!(result, Err(AppError::InvalidToken(_))));
    }

    #[test]
    fn test_token_with_different_secret() {
        let issuer = TokenConfig::new("secret-one".to_string(), 24);
        let other = TokenConfig::new("secret-two".to_string(), 24);

        let token = issuer.create_token(&user(), false).unwrap();
        assert!(issuer.validate_token(&token).is_ok());
        assert!(matches!(
            other.validate_token(&token),
            Err(AppError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // Far enough in the past to clear the default 60s leeway
        let config = TokenConfig::new(TEST_SECRET.to_string(), -2);
        let token = config.create_token(&user(), false).unwrap();
        assert!(matches!(
            config.validate_token(&token),
            Err(AppError::InvalidToken(_))
        ));
    }
}
