use rand::Rng;
use uuid::Uuid;

/// Source of one-time verification codes
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Uniform six-digit codes in 100000..=999999
pub struct RandomCodeGenerator;

impl RandomCodeGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RandomCodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> String {
        rand::rng().random_range(100_000..=999_999u32).to_string()
    }
}

/// Source of verified-session identifiers
pub trait SessionIdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// UUID v4 identifiers (122 random bits) rendered as 32 hex characters
pub struct UuidSessionIdGenerator;

impl UuidSessionIdGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UuidSessionIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionIdGenerator for UuidSessionIdGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_codes_are_six_digits() {
        let generator = RandomCodeGenerator::new();
        for _ in 0..1000 {
            let code = generator.generate();
            assert_eq!(code.len(), 6);
            let value: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&value));
        }
    }

    #[test]
    fn test_session_ids_are_hex_and_unique() {
        let generator = UuidSessionIdGenerator::new();
        let ids: HashSet<String> = (0..100).map(|_| generator.generate()).collect();

        assert_eq!(ids.len(), 100);
        for id in &ids {
            assert_eq!(id.len(), 32);
            assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }
}
