use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::{NewUser, Role, UserModel};
use crate::database::map_db_error;
use crate::shared::AppError;

const DUPLICATE_USER: &str = "Document number or email is already registered";

/// Trait for user repository operations
#[async_trait]
pub trait UserRepository {
    /// Inserts a user, failing with `Conflict` when the email or document number is taken
    async fn create_user(&self, user: &NewUser) -> Result<UserModel, AppError>;
    async fn get_user(&self, user_id: i32) -> Result<Option<UserModel>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError>;
    async fn list_users(&self, role: Option<Role>) -> Result<Vec<UserModel>, AppError>;

    /// Returns "first last" display names for the ids that exist
    async fn display_names(&self, user_ids: &[i32]) -> Result<HashMap<i32, String>, AppError>;
}

struct UserTable {
    next_id: i32,
    users: HashMap<i32, UserModel>,
}

/// In-memory implementation of UserRepository for development and testing
pub struct InMemoryUserRepository {
    table: Mutex<UserTable>,
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            table: Mutex::new(UserTable {
                next_id: 1,
                users: HashMap::new(),
            }),
        }
    }

    /// Creates an in-memory repository with pre-populated users
    pub fn with_users(users: Vec<UserModel>) -> Self {
        let next_id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        let users = users.into_iter().map(|u| (u.id, u)).collect();

        Self {
            table: Mutex::new(UserTable { next_id, users }),
        }
    }

    /// Returns the current number of users in the repository
    pub fn user_count(&self) -> usize {
        self.table.lock().unwrap().users.len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create_user(&self, user: &NewUser) -> Result<UserModel, AppError> {
        let mut table = self.table.lock().unwrap();

        let duplicate = table.users.values().any(|existing| {
            existing.email == user.email || existing.document_number == user.document_number
        });
        if duplicate {
            warn!("User already exists in memory");
            return Err(AppError::Conflict(DUPLICATE_USER.to_string()));
        }

        let id = table.next_id;
        table.next_id += 1;
        let model = user.clone().into_model(id);
        table.users.insert(id, model.clone());

        debug!(user_id = id, role = %model.role, "User created in memory");
        Ok(model)
    }

    #[instrument(skip(self))]
    async fn get_user(&self, user_id: i32) -> Result<Option<UserModel>, AppError> {
        let table = self.table.lock().unwrap();
        Ok(table.users.get(&user_id).cloned())
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError> {
        let table = self.table.lock().unwrap();
        Ok(table.users.values().find(|u| u.email == email).cloned())
    }

    #[instrument(skip(self))]
    async fn list_users(&self, role: Option<Role>) -> Result<Vec<UserModel>, AppError> {
        let table = self.table.lock().unwrap();
        let mut users: Vec<UserModel> = table
            .users
            .values()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .cloned()
            .collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    #[instrument(skip(self))]
    async fn display_names(&self, user_ids: &[i32]) -> Result<HashMap<i32, String>, AppError> {
        let table = self.table.lock().unwrap();
        Ok(user_ids
            .iter()
            .filter_map(|id| table.users.get(id).map(|u| (*id, u.display_name())))
            .collect())
    }
}

/// PostgreSQL implementation of user repository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, first_name, second_name, last_name, second_last_name, \
     document_number, email, address, phone, role, is_email_verified, password_hash, created_at";

fn user_from_row(row: &PgRow) -> Result<UserModel, AppError> {
    let role: String = row
        .try_get("role")
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;
    let role = Role::from_str(&role)
        .map_err(|_| AppError::DatabaseError(format!("Unknown role in users table: {role}")))?;

    let read = |e: sqlx::Error| AppError::DatabaseError(e.to_string());
    Ok(UserModel {
        id: row.try_get("id").map_err(read)?,
        first_name: row.try_get("first_name").map_err(read)?,
        second_name: row.try_get("second_name").map_err(read)?,
        last_name: row.try_get("last_name").map_err(read)?,
        second_last_name: row.try_get("second_last_name").map_err(read)?,
        document_number: row.try_get("document_number").map_err(read)?,
        email: row.try_get("email").map_err(read)?,
        address: row.try_get("address").map_err(read)?,
        phone: row.try_get("phone").map_err(read)?,
        role,
        is_email_verified: row.try_get("is_email_verified").map_err(read)?,
        password_hash: row.try_get("password_hash").map_err(read)?,
        created_at: row.try_get("created_at").map_err(read)?,
    })
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create_user(&self, user: &NewUser) -> Result<UserModel, AppError> {
        debug!("Creating user in database");

        let row = sqlx::query(&format!(
            "INSERT INTO users (first_name, second_name, last_name, second_last_name, document_number, \
             email, address, phone, role, is_email_verified, password_hash) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.first_name)
        .bind(&user.second_name)
        .bind(&user.last_name)
        .bind(&user.second_last_name)
        .bind(&user.document_number)
        .bind(&user.email)
        .bind(&user.address)
        .bind(&user.phone)
        .bind(user.role.as_ref())
        .bind(user.is_email_verified)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, DUPLICATE_USER))?;

        user_from_row(&row)
    }

    #[instrument(skip(self))]
    async fn get_user(&self, user_id: i32) -> Result<Option<UserModel>, AppError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error(e, DUPLICATE_USER))?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, AppError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error(e, DUPLICATE_USER))?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn list_users(&self, role: Option<Role>) -> Result<Vec<UserModel>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE ($1::TEXT IS NULL OR role = $1) ORDER BY id"
        ))
        .bind(role.map(|r| r.as_ref().to_string()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error(e, DUPLICATE_USER))?;

        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn display_names(&self, user_ids: &[i32]) -> Result<HashMap<i32, String>, AppError> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            "SELECT id, first_name || ' ' || last_name AS display_name FROM users WHERE id = ANY($1)",
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error(e, DUPLICATE_USER))?;

        rows.iter()
            .map(|row| {
                let id: i32 = row
                    .try_get("id")
                    .map_err(|e| AppError::DatabaseError(e.to_string()))?;
                let name: String = row
                    .try_get("display_name")
                    .map_err(|e| AppError::DatabaseError(e.to_string()))?;
                Ok((id, name))
            })
            .collect()
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    pub fn new_user(email: &str, document: &str, role: Role) -> NewUser {
        NewUser {
            first_name: "Ana".to_string(),
            second_name: None,
            last_name: "Mora".to_string(),
            second_last_name: None,
            document_number: document.to_string(),
            email: email.to_string(),
            address: "Calle 1".to_string(),
            phone: "3000000000".to_string(),
            role,
            is_email_verified: false,
            password_hash: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let repo = InMemoryUserRepository::new();

        let created = repo
            .create_user(&new_user("ana@example.com", "100", Role::Client))
            .await
            .unwrap();
        assert_eq!(created.id, 1);

        let fetched = repo.get_user(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);

        let by_email = repo.find_by_email("ana@example.com").await.unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(created.id));
    }

    #[tokio::test]
    async fn test_duplicate_email_or_document_conflicts() {
        let repo = InMemoryUserRepository::new();
        repo.create_user(&new_user("ana@example.com", "100", Role::Client))
            .await
            .unwrap();

        let same_email = repo
            .create_user(&new_user("ana@example.com", "200", Role::Client))
            .await;
        assert!(matches!(same_email, Err(AppError::Conflict(_))));

        let same_document = repo
            .create_user(&new_user("other@example.com", "100", Role::Client))
            .await;
        assert!(matches!(same_document, Err(AppError::Conflict(_))));

        assert_eq!(repo.user_count(), 1);
    }

    #[tokio::test]
    async fn test_list_users_filters_by_role() {
        let repo = InMemoryUserRepository::new();
        repo.create_user(&new_user("c@example.com", "1", Role::Client))
            .await
            .unwrap();
        repo.create_user(&new_user("m@example.com", "2", Role::Messenger))
            .await
            .unwrap();

        let messengers = repo.list_users(Some(Role::Messenger)).await.unwrap();
        assert_eq!(messengers.len(), 1);
        assert_eq!(messengers[0].email, "m@example.com");

        let everyone = repo.list_users(None).await.unwrap();
        assert_eq!(everyone.len(), 2);
    }

    #[tokio::test]
    async fn test_display_names_skips_unknown_ids() {
        let repo = InMemoryUserRepository::new();
        let user = repo
            .create_user(&new_user("c@example.com", "1", Role::Client))
            .await
            .unwrap();

        let names = repo.display_names(&[user.id, 99]).await.unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(names.get(&user.id), Some(&"Ana Mora".to_string()));
    }

    #[tokio::test]
    async fn test_with_users_continues_id_sequence() {
        let seeded = new_user("seed@example.com", "9", Role::Admin).into_model(7);
        let repo = InMemoryUserRepository::with_users(vec![seeded]);

        let created = repo
            .create_user(&new_user("next@example.com", "10", Role::Client))
            .await
            .unwrap();
        assert_eq!(created.id, 8);
    }
}
