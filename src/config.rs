use std::time::Duration;

use thiserror::Error;
use tracing::warn;

const DEV_JWT_SECRET: &str = "parcel-tracker-dev-secret-change-in-production";

/// Shortest and longest lifetime accepted for a one-time verification code
const MIN_CODE_TTL_MINUTES: i64 = 2;
const MAX_CODE_TTL_MINUTES: i64 = 5;

/// Upper bound for session and credential lifetimes (one year)
const MAX_TTL_HOURS: i64 = 24 * 365;
const MAX_SWEEP_INTERVAL_SECS: u64 = 24 * 60 * 60;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{key} must be set when NODE_ENV=production")]
    MissingInProduction { key: &'static str },

    #[error("{key} has an invalid value: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Deployment environment, selected by `NODE_ENV`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// Which backing store the repositories use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl StorageBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageBackend::Postgres => "postgres",
            StorageBackend::Memory => "memory",
        }
    }
}

/// How to reach PostgreSQL
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseConfig {
    /// Full connection string; TLS is required when `require_tls` is set
    Url { url: String, require_tls: bool },
    Discrete {
        host: String,
        port: u16,
        name: String,
        user: String,
        password: String,
    },
}

/// Lifetimes for codes, verified sessions and issued credentials
#[derive(Debug, Clone, PartialEq)]
pub struct AuthPolicy {
    pub code_ttl_minutes: i64,
    pub session_ttl_hours: i64,
    pub credential_ttl_hours: i64,
    pub sweep_interval: Duration,
    pub bcrypt_cost: u32,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            code_ttl_minutes: MAX_CODE_TTL_MINUTES,
            session_ttl_hours: 24,
            credential_ttl_hours: 24,
            sweep_interval: Duration::from_secs(60 * 60),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// Settings handlers need at request time
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub bcrypt_cost: u32,
    pub tracking_base_url: String,
    pub storage: StorageBackend,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            bcrypt_cost: bcrypt::DEFAULT_COST,
            tracking_base_url: "http://localhost:3000/tracking".to_string(),
            storage: StorageBackend::Memory,
        }
    }
}

/// Process configuration read from the environment at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub environment: Environment,
    pub storage: StorageBackend,
    pub database: DatabaseConfig,
    pub jwt_secret: String,
    pub auth: AuthPolicy,
    pub tracking_base_url: String,
    pub cors_origin: String,
}

impl AppConfig {
    /// Loads `.env` (if present) and reads the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is the normal case outside local development
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = match get("NODE_ENV").as_deref() {
            Some("production") => Environment::Production,
            _ => Environment::Development,
        };

        let storage = match get("STORAGE_BACKEND").as_deref() {
            None | Some("postgres") => StorageBackend::Postgres,
            Some("memory") => StorageBackend::Memory,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "STORAGE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let database = if environment.is_production() {
            let url = get("DATABASE_URL").ok_or(ConfigError::MissingInProduction {
                key: "DATABASE_URL",
            })?;
            DatabaseConfig::Url {
                url,
                require_tls: true,
            }
        } else if let Some(url) = get("DATABASE_URL") {
            DatabaseConfig::Url {
                url,
                require_tls: false,
            }
        } else {
            DatabaseConfig::Discrete {
                host: get("DB_HOST").unwrap_or_else(|| "localhost".to_string()),
                port: parse_or(&get, "DB_PORT", 5432)?,
                name: get("DB_NAME").unwrap_or_else(|| "logistica_uraba".to_string()),
                user: get("DB_USER").unwrap_or_else(|| "postgres".to_string()),
                password: get("DB_PASSWORD").unwrap_or_else(|| "admin".to_string()),
            }
        };

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None if environment.is_production() => {
                return Err(ConfigError::MissingInProduction { key: "JWT_SECRET" })
            }
            None => {
                warn!("JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let defaults = AuthPolicy::default();
        let code_ttl_minutes: i64 =
            parse_or(&get, "VERIFICATION_CODE_TTL_MINUTES", defaults.code_ttl_minutes)?;
        let auth = AuthPolicy {
            code_ttl_minutes: code_ttl_minutes.clamp(MIN_CODE_TTL_MINUTES, MAX_CODE_TTL_MINUTES),
            session_ttl_hours: bounded(
                "VERIFIED_SESSION_TTL_HOURS",
                parse_or(&get, "VERIFIED_SESSION_TTL_HOURS", defaults.session_ttl_hours)?,
                MAX_TTL_HOURS,
            )?,
            credential_ttl_hours: bounded(
                "CREDENTIAL_TTL_HOURS",
                parse_or(&get, "CREDENTIAL_TTL_HOURS", defaults.credential_ttl_hours)?,
                MAX_TTL_HOURS,
            )?,
            sweep_interval: Duration::from_secs(bounded(
                "SESSION_SWEEP_INTERVAL_SECS",
                parse_or(
                    &get,
                    "SESSION_SWEEP_INTERVAL_SECS",
                    defaults.sweep_interval.as_secs(),
                )?,
                MAX_SWEEP_INTERVAL_SECS,
            )?),
            bcrypt_cost: parse_or(&get, "BCRYPT_COST", defaults.bcrypt_cost)?,
        };

        Ok(Self {
            port: parse_or(&get, "PORT", 3001)?,
            environment,
            storage,
            database,
            jwt_secret,
            auth,
            tracking_base_url: get("TRACKING_BASE_URL")
                .unwrap_or_else(|| "http://localhost:3000/tracking".to_string()),
            cors_origin: get("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string()),
        })
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            bcrypt_cost: self.auth.bcrypt_cost,
            tracking_base_url: self.tracking_base_url.clone(),
            storage: self.storage,
        }
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        None => Ok(default),
    }
}

/// Accepts values in `1..=max`
fn bounded<T>(key: &'static str, value: T, max: T) -> Result<T, ConfigError>
where
    T: PartialOrd + Default + ToString,
{
    if value > T::default() && value <= max {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        })
    }
}
