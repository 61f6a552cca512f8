// Public API - what other modules can use
pub use cleanup_task::{start_sweep_task, SweepConfig};
pub use handlers::{send_token, verify_token};
pub use models::{SweepReport, TokenPolicy, VerificationCode, VerifiedSession};
pub use notifier::{CodeNotifier, LoggingCodeNotifier};
pub use store::{InMemoryTokenStore, TokenError, TokenStore};

// Internal modules
pub mod cleanup_task;
pub mod generators;
mod handlers;
pub mod models;
pub mod notifier;
pub mod service;
pub mod store;
pub mod types;
