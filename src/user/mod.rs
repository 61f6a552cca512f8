// Public API - what other modules can use
pub use handlers::{create_user, list_users};
pub use models::{Role, UserModel};
pub use repository::{InMemoryUserRepository, PostgresUserRepository, UserRepository};
pub use types::UserProfile;

// Internal modules
mod handlers;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod types;
