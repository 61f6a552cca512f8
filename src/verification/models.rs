use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One-time code sent to an email address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCode {
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl VerificationCode {
    pub fn new(email: String, code: String, ttl: Duration) -> Self {
        Self {
            email,
            code,
            expires_at: Utc::now() + ttl,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Proof that a code was verified; redeemable for one login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedSession {
    pub id: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

impl VerifiedSession {
    pub fn new(id: String, email: String, ttl: Duration) -> Self {
        Self {
            id,
            email,
            expires_at: Utc::now() + ttl,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Lifetimes applied by the token store
#[derive(Debug, Clone)]
pub struct TokenPolicy {
    pub code_ttl: Duration,
    pub session_ttl: Duration,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            code_ttl: Duration::minutes(5),
            session_ttl: Duration::hours(24),
        }
    }
}

/// Counts of entries removed by one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub codes_removed: usize,
    pub sessions_removed: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.codes_removed + self.sessions_removed
    }
}
