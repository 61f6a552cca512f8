use std::str::FromStr;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tracing::{info, instrument};

use super::{
    models::{NewUser, Role},
    password::hash_password,
    repository::UserRepository,
    types::{CreateUserRequest, RegisterRequest, UserProfile, ValidatedRegistration},
};
use crate::shared::AppError;

/// Service for account creation and lookup
pub struct UserService {
    repository: Arc<dyn UserRepository + Send + Sync>,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository + Send + Sync>, bcrypt_cost: u32) -> Self {
        Self {
            repository,
            bcrypt_cost,
        }
    }

    /// Self-registration; always creates an unverified client
    #[instrument(skip(self, request))]
    pub async fn register_client(&self, request: RegisterRequest) -> Result<UserProfile, AppError> {
        let registration = request.validate()?;
        self.create(registration, Role::Client).await
    }

    /// Staff-driven creation of an account with an explicit role
    #[instrument(skip(self, request))]
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<UserProfile, AppError> {
        let role = parse_role(request.role.as_deref())?
            .ok_or_else(|| AppError::Validation("Missing required field: role".to_string()))?;
        let registration = request.profile.validate()?;
        self.create(registration, role).await
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self, role: Option<&str>) -> Result<Vec<UserProfile>, AppError> {
        let role = parse_role(role)?;
        let users = self.repository.list_users(role).await?;
        Ok(users.iter().map(UserProfile::from).collect())
    }

    async fn create(
        &self,
        registration: ValidatedRegistration,
        role: Role,
    ) -> Result<UserProfile, AppError> {
        // Accounts registered without a password sign in with their document number
        let secret = registration
            .password
            .clone()
            .unwrap_or_else(|| registration.document_number.clone());
        let password_hash = hash_password(secret, self.bcrypt_cost).await?;

        let new_user = NewUser {
            first_name: registration.first_name,
            second_name: registration.second_name,
            last_name: registration.last_name,
            second_last_name: registration.second_last_name,
            document_number: registration.document_number,
            email: registration.email,
            address: registration.address,
            phone: registration.phone,
            role,
            is_email_verified: false,
            password_hash: Some(password_hash),
        };

        let user = self.repository.create_user(&new_user).await?;
        info!(user_id = user.id, role = %user.role, "User registered");

        Ok(UserProfile::from(&user))
    }
}

fn parse_role(raw: Option<&str>) -> Result<Option<Role>, AppError> {
    match raw.map(str::trim).filter(|r| !r.is_empty()) {
        None => Ok(None),
        Some(raw) => Role::from_str(raw).map(Some).map_err(|_| {
            let valid: Vec<String> = Role::iter().map(|r| r.to_string()).collect();
            AppError::Validation(format!(
                "Invalid role '{raw}', expected one of: {}",
                valid.join(", ")
            ))
        }),
    }
}
