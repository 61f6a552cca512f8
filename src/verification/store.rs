use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info, instrument};

use super::generators::{
    CodeGenerator, RandomCodeGenerator, SessionIdGenerator, UuidSessionIdGenerator,
};
use super::models::{SweepReport, TokenPolicy, VerificationCode, VerifiedSession};
use crate::shared::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("No code found for this email. Request a new one.")]
    NotFound,

    #[error("Code expired. Request a new one.")]
    Expired,

    #[error("Invalid code")]
    Mismatch,

    #[error("Token store unavailable: {0}")]
    Backend(String),
}

impl From<TokenError> for AppError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::Backend(msg) => AppError::Internal(msg),
            other => AppError::Validation(other.to_string()),
        }
    }
}

/// Short-lived verification codes and the sessions minted from them.
///
/// Every mutation is atomic per key: a code can be consumed at most once and a
/// session redeemed at most once, whatever the interleaving of callers.
#[async_trait]
pub trait TokenStore {
    /// Issues a fresh code for the email, replacing any code still pending
    async fn issue_code(&self, email: &str) -> Result<VerificationCode, TokenError>;

    /// Checks a submitted code and, on a match, trades it for a verified session
    async fn consume_code(&self, email: &str, submitted: &str)
        -> Result<VerifiedSession, TokenError>;

    /// Email behind a live session, without using it up
    async fn resolve_session(&self, session_id: &str) -> Result<Option<String>, TokenError>;

    /// Removes the session if it is live and belongs to `email`; true when it did
    async fn redeem_session(&self, session_id: &str, email: &str) -> Result<bool, TokenError>;

    /// Drops every expired code and session
    async fn sweep(&self) -> Result<SweepReport, TokenError>;
}

/// Process-memory token store
pub struct InMemoryTokenStore {
    codes: Mutex<HashMap<String, VerificationCode>>,
    sessions: Mutex<HashMap<String, VerifiedSession>>,
    policy: TokenPolicy,
    code_generator: Arc<dyn CodeGenerator>,
    session_id_generator: Arc<dyn SessionIdGenerator>,
}

impl Default for InMemoryTokenStore {
    fn default() -> Self {
        Self::new(TokenPolicy::default())
    }
}

impl InMemoryTokenStore {
    pub fn new(policy: TokenPolicy) -> Self {
        Self::with_generators(
            policy,
            Arc::new(RandomCodeGenerator::new()),
            Arc::new(UuidSessionIdGenerator::new()),
        )
    }

    pub fn with_generators(
        policy: TokenPolicy,
        code_generator: Arc<dyn CodeGenerator>,
        session_id_generator: Arc<dyn SessionIdGenerator>,
    ) -> Self {
        Self {
            codes: Mutex::new(HashMap::new()),
            sessions: Mutex::new(HashMap::new()),
            policy,
            code_generator,
            session_id_generator,
        }
    }

    /// Pre-populates pending codes, keyed by their email
    pub fn with_codes(self, codes: Vec<VerificationCode>) -> Self {
        {
            let mut map = self.codes.lock().unwrap();
            for code in codes {
                map.insert(code.email.clone(), code);
            }
        }
        self
    }

    /// Pre-populates verified sessions
    pub fn with_sessions(self, sessions: Vec<VerifiedSession>) -> Self {
        {
            let mut map = self.sessions.lock().unwrap();
            for session in sessions {
                map.insert(session.id.clone(), session);
            }
        }
        self
    }

    pub fn policy(&self) -> &TokenPolicy {
        &self.policy
    }

    /// Pending code for an email (useful for debugging and tests)
    pub fn code_for(&self, email: &str) -> Option<String> {
        self.codes.lock().unwrap().get(email).map(|c| c.code.clone())
    }

    pub fn code_count(&self) -> usize {
        self.codes.lock().unwrap().len()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    #[instrument(skip(self))]
    async fn issue_code(&self, email: &str) -> Result<VerificationCode, TokenError> {
        let code = VerificationCode::new(
            email.to_string(),
            self.code_generator.generate(),
            self.policy.code_ttl,
        );

        let replaced = self
            .codes
            .lock()
            .unwrap()
            .insert(email.to_string(), code.clone());

        debug!(
            replaced_pending = replaced.is_some(),
            expires_at = %code.expires_at,
            "Verification code issued"
        );
        Ok(code)
    }

    #[instrument(skip(self, submitted))]
    async fn consume_code(
        &self,
        email: &str,
        submitted: &str,
    ) -> Result<VerifiedSession, TokenError> {
        {
            let mut codes = self.codes.lock().unwrap();
            let pending = codes.get(email).ok_or(TokenError::NotFound)?;

            if pending.is_expired() {
                codes.remove(email);
                debug!("Verification code expired, removed");
                return Err(TokenError::Expired);
            }
            if pending.code != submitted {
                debug!("Verification code mismatch");
                return Err(TokenError::Mismatch);
            }
            codes.remove(email);
        }

        let session = VerifiedSession::new(
            self.session_id_generator.generate(),
            email.to_string(),
            self.policy.session_ttl,
        );
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id.clone(), session.clone());

        info!(expires_at = %session.expires_at, "Verification code accepted, session minted");
        Ok(session)
    }

    #[instrument(skip(self, session_id))]
    async fn resolve_session(&self, session_id: &str) -> Result<Option<String>, TokenError> {
        let sessions = self.sessions.lock().unwrap();
        Ok(sessions
            .get(session_id)
            .filter(|s| !s.is_expired())
            .map(|s| s.email.clone()))
    }

    #[instrument(skip(self, session_id))]
    async fn redeem_session(&self, session_id: &str, email: &str) -> Result<bool, TokenError> {
        let mut sessions = self.sessions.lock().unwrap();

        let redeemable = sessions
            .get(session_id)
            .is_some_and(|s| s.email == email && !s.is_expired());
        if redeemable {
            sessions.remove(session_id);
            debug!("Verified session redeemed");
        }
        Ok(redeemable)
    }

    #[instrument(skip(self))]
    async fn sweep(&self) -> Result<SweepReport, TokenError> {
        let now = Utc::now();

        let codes_removed = {
            let mut codes = self.codes.lock().unwrap();
            let before = codes.len();
            codes.retain(|_, code| !code.is_expired_at(now));
            before - codes.len()
        };
        let sessions_removed = {
            let mut sessions = self.sessions.lock().unwrap();
            let before = sessions.len();
            sessions.retain(|_, session| !session.is_expired_at(now));
            before - sessions.len()
        };

        Ok(SweepReport {
            codes_removed,
            sessions_removed,
        })
    }
}
