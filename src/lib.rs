// Library crate for the parcel tracking service
// This file exposes the public API for the binary and integration tests

pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod package;
pub mod shared;
pub mod user;
pub mod verification;

// Re-export commonly used types for easier access in tests
pub use app::build_router;
pub use auth::{AuthClaims, TokenConfig};
pub use config::{AppConfig, ServiceSettings, StorageBackend};
pub use package::{InMemoryPackageRepository, PackageRepository, PackageStatus};
pub use shared::{AppError, AppState};
pub use user::{InMemoryUserRepository, Role, UserRepository};
pub use verification::{CodeNotifier, InMemoryTokenStore, TokenPolicy, TokenStore};
