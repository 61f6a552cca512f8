use axum::Router;
use chrono::Duration;
use std::sync::Arc;

use parcel_tracker::{
    build_router,
    config::{ServiceSettings, StorageBackend},
    AppState, InMemoryPackageRepository, InMemoryTokenStore, InMemoryUserRepository,
    TokenConfig, TokenPolicy,
};

use super::mocks::RecordingNotifier;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub const TEST_BCRYPT_COST: u32 = 4;

pub struct TestSetup {
    pub app: Router,
    pub users: Arc<InMemoryUserRepository>,
    pub packages: Arc<InMemoryPackageRepository>,
    pub token_store: Arc<InMemoryTokenStore>,
    pub notifier: RecordingNotifier,
    pub token_config: TokenConfig,
}

pub struct TestSetupBuilder {
    policy: TokenPolicy,
    token_config: TokenConfig,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            policy: TokenPolicy::default(),
            token_config: TokenConfig::new("integration-test-secret".to_string(), 24),
        }
    }

    pub fn with_code_ttl(mut self, ttl: Duration) -> Self {
        self.policy.code_ttl = ttl;
        self
    }

    pub fn build(self) -> TestSetup {
        let users = Arc::new(InMemoryUserRepository::new());
        let packages = Arc::new(InMemoryPackageRepository::new());
        let token_store = Arc::new(InMemoryTokenStore::new(self.policy));
        let notifier = RecordingNotifier::new();

        let state = AppState::new(
            users.clone(),
            packages.clone(),
            token_store.clone(),
            Arc::new(notifier.clone()),
            self.token_config.clone(),
            ServiceSettings {
                bcrypt_cost: TEST_BCRYPT_COST,
                tracking_base_url: "http://localhost:3000/tracking".to_string(),
                storage: StorageBackend::Memory,
            },
        );

        TestSetup {
            app: build_router(state, None),
            users,
            packages,
            token_store,
            notifier,
            token_config: self.token_config,
        }
    }
}
