use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Role assigned to a user at creation time; never changes afterwards
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Client,
    Messenger,
    Operator,
    Admin,
}

impl Role {
    /// Operators and admins run the warehouse side of the system
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Operator | Role::Admin)
    }
}

/// Database model for the users table
#[derive(Debug, Clone, PartialEq)]
pub struct UserModel {
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
    /// Absent only for legacy bootstrap accounts
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserModel {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Fields required to insert a user; the store assigns id and created_at
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
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
    pub password_hash: Option<String>,
}

impl NewUser {
    pub fn into_model(self, id: i32) -> UserModel {
        UserModel {
            id,
            first_name: self.first_name,
            second_name: self.second_name,
            last_name: self.last_name,
            second_last_name: self.second_last_name,
            document_number: self.document_number,
            email: self.email,
            address: self.address,
            phone: self.phone,
            role: self.role,
            is_email_verified: self.is_email_verified,
            password_hash: self.password_hash,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[rstest]
    #[case("client", Role::Client)]
    #[case("messenger", Role::Messenger)]
    #[case("operator", Role::Operator)]
    #[case("admin", Role::Admin)]
    fn test_role_parses_from_storage_text(#[case] raw: &str, #[case] expected: Role) {
        assert_eq!(Role::from_str(raw).unwrap(), expected);
        assert_eq!(expected.as_ref(), raw);
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        assert!(Role::from_str("courier").is_err());
        assert!(Role::from_str("Admin").is_err());
    }

    #[test]
    fn test_only_operator_and_admin_are_staff() {
        let staff: Vec<Role> = Role::iter().filter(|r| r.is_staff()).collect();
        assert_eq!(staff, vec![Role::Operator, Role::Admin]);
    }

    #[test]
    fn test_role_serializes_snake_case() {
        let json = serde_json::to_string(&Role::Messenger).unwrap();
        assert_eq!(json, "\"messenger\"");
    }
}
