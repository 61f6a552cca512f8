// Public API - what other modules can use
pub use handlers::{login, logout, register, verify};
pub use middleware::jwt_auth;
pub use token::TokenConfig;
pub use types::AuthClaims;

// Internal modules
mod handlers;
pub mod middleware;
pub mod service;
pub mod token;
pub mod types;
