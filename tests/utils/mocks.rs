use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use parcel_tracker::{
    shared::AppError,
    verification::{CodeNotifier, VerificationCode},
};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Captures every code handed to the notifier instead of emailing it
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    delivered: Arc<RwLock<Vec<VerificationCode>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn last_code_for(&self, email: &str) -> Option<String> {
        self.delivered
            .read()
            .await
            .iter()
            .rev()
            .find(|c| c.email == email)
            .map(|c| c.code.clone())
    }

    pub async fn delivered_count(&self) -> usize {
        self.delivered.read().await.len()
    }
}

#[async_trait]
impl CodeNotifier for RecordingNotifier {
    async fn deliver(&self, code: &VerificationCode) -> Result<(), AppError> {
        self.delivered.write().await.push(code.clone());
        Ok(())
    }
}
