use tracing::{instrument, warn};

use super::models::UserModel;
use crate::shared::AppError;

/// Hashes a password with bcrypt on the blocking pool
pub async fn hash_password(plain: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))
}

/// Checks a login password against the stored credential.
///
/// Accounts with a bcrypt hash are checked against it. Accounts created
/// before hashes existed have none and go through [`legacy`].
#[instrument(skip(user, candidate), fields(user_id = user.id))]
pub async fn verify_password(user: &UserModel, candidate: String) -> Result<bool, AppError> {
    match &user.password_hash {
        Some(hash) => {
            let hash = hash.clone();
            tokio::task::spawn_blocking(move || bcrypt::verify(candidate, &hash))
                .await
                .map_err(|e| AppError::Internal(format!("Password check task failed: {e}")))?
                .map_err(|e| AppError::Internal(format!("Stored password hash is unusable: {e}")))
        }
        None => Ok(legacy::matches_document_number(user, &candidate)),
    }
}

/// Migration path for bootstrap accounts that were loaded without a password
/// hash. Those accounts sign in with their document number until they are
/// re-registered with a real password.
pub mod legacy {
    use super::*;

    pub fn matches_document_number(user: &UserModel, candidate: &str) -> bool {
        warn!(
            user_id = user.id,
            "Account has no password hash, falling back to document number"
        );
        !user.document_number.is_empty() && candidate == user.document_number
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::models::Role;
    use crate::user::repository::tests::new_user;

    const TEST_COST: u32 = 4;

    fn user_with_hash(hash: Option<String>) -> UserModel {
        let mut new_user = new_user("ana@example.com", "1037", Role::Client);
        new_user.password_hash = hash;
        new_user.into_model(1)
    }

    #[tokio::test]
    async fn test_hash_then_verify() {
        let hash = hash_password("s3cret".to_string(), TEST_COST).await.unwrap();
        assert_ne!(hash, "s3cret");

        let user = user_with_hash(Some(hash));
        assert!(verify_password(&user, "s3cret".to_string()).await.unwrap());
        assert!(!verify_password(&user, "wrong".to_string()).await.unwrap());
    }

    #[tokio::test]
    async fn test_document_number_does_not_unlock_hashed_account() {
        let hash = hash_password("s3cret".to_string(), TEST_COST).await.unwrap();
        let user = user_with_hash(Some(hash));

        assert!(!verify_password(&user, "1037".to_string()).await.unwrap());
    }

    #[tokio::test]
    async fn test_legacy_account_uses_document_number() {
        let user = user_with_hash(None);

        assert!(verify_password(&user, "1037".to_string()).await.unwrap());
        assert!(!verify_password(&user, "1038".to_string()).await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_hash_is_an_internal_error() {
        let user = user_with_hash(Some("not-a-bcrypt-hash".to_string()));

        let result = verify_password(&user, "anything".to_string()).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
