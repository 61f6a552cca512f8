use serde::{Deserialize, Serialize};

use super::models::{Role, UserModel};
use crate::shared::{required, AppError};

/// Request payload for self-registration and staff account creation.
/// Every field is optional on the wire so missing ones map to a 400.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub second_name: Option<String>,
    pub last_name: Option<String>,
    pub second_last_name: Option<String>,
    pub document_number: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

/// Registration fields after the presence check
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRegistration {
    pub first_name: String,
    pub second_name: Option<String>,
    pub last_name: String,
    pub second_last_name: Option<String>,
    pub document_number: String,
    pub email: String,
    pub address: String,
    pub phone: String,
    pub password: Option<String>,
}

impl RegisterRequest {
    pub fn validate(self) -> Result<ValidatedRegistration, AppError> {
        let missing = || AppError::Validation("Missing required fields".to_string());

        Ok(ValidatedRegistration {
            first_name: required(self.first_name).ok_or_else(missing)?,
            last_name: required(self.last_name).ok_or_else(missing)?,
            document_number: required(self.document_number).ok_or_else(missing)?,
            email: required(self.email).ok_or_else(missing)?,
            address: required(self.address).ok_or_else(missing)?,
            phone: required(self.phone).ok_or_else(missing)?,
            second_name: required(self.second_name),
            second_last_name: required(self.second_last_name),
            // Passwords are taken verbatim; only an empty one counts as absent
            password: self.password.filter(|p| !p.is_empty()),
        })
    }
}

/// Request payload for operator/admin account creation
#[derive(Debug, Default, Deserialize)]
pub struct CreateUserRequest {
    #[serde(flatten)]
    pub profile: RegisterRequest,
    pub role: Option<String>,
}

/// Query string for user listing
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<String>,
}

/// Public view of a user; never carries the password hash
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: i32,
    pub first_name: String,
    pub second_name: Option<String>,
    pub last_name: String,
    pub second_last_name: Option<String>,
    pub document_number: String,
    pub email: String,
    pub address: String,
    pub phone: String,
    pub role: Role,
    pub is_email_verified: bool,
}

impl From<&UserModel> for UserProfile {
    fn from(user: &UserModel) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            second_name: user.second_name.clone(),
            last_name: user.last_name.clone(),
            second_last_name: user.second_last_name.clone(),
            document_number: user.document_number.clone(),
            email: user.email.clone(),
            address: user.address.clone(),
            phone: user.phone.clone(),
            role: user.role,
            is_email_verified: user.is_email_verified,
        }
    }
}

/// Response for account creation endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct UserCreatedResponse {
    pub message: String,
    pub user: UserProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> RegisterRequest {
        RegisterRequest {
            first_name: Some("Ana".to_string()),
            last_name: Some("Mora".to_string()),
            document_number: Some("1037".to_string()),
            email: Some("ana@example.com".to_string()),
            address: Some("Calle 1".to_string()),
            phone: Some("3000000000".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_complete_request_validates() {
        let validated = full_request().validate().unwrap();
        assert_eq!(validated.email, "ana@example.com");
        assert_eq!(validated.password, None);
    }

    #[test]
    fn test_blank_required_field_is_missing() {
        let mut request = full_request();
        request.phone = Some("   ".to_string());

        let result = request.validate();
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_fields_are_trimmed() {
        let mut request = full_request();
        request.email = Some("  ana@example.com ".to_string());

        assert_eq!(request.validate().unwrap().email, "ana@example.com");
    }

    #[test]
    fn test_profile_never_serializes_password_hash() {
        let mut user = crate::user::repository::tests::new_user("a@b.c", "1", Role::Client);
        user.password_hash = Some("$2b$12$hash".to_string());
        let profile = UserProfile::from(&user.into_model(1));

        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("$2b$"));
    }

    #[test]
    fn test_create_user_request_flattens_profile() {
        let request: CreateUserRequest = serde_json::from_str(
            r#"{"first_name":"Leo","last_name":"Paz","document_number":"9","email":"l@p.co",
                "address":"Cra 2","phone":"1","role":"messenger"}"#,
        )
        .unwrap();

        assert_eq!(request.role.as_deref(), Some("messenger"));
        assert_eq!(request.profile.first_name.as_deref(), Some("Leo"));
    }
}
