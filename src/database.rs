use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use tracing::{info, warn};

use crate::config::DatabaseConfig;
use crate::shared::AppError;

/// Opens the connection pool and applies the embedded migrations
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let options = match config {
        DatabaseConfig::Url { url, require_tls } => {
            let options: PgConnectOptions = url.parse()?;
            if *require_tls {
                info!("Connecting to remote PostgreSQL (TLS required)");
                options.ssl_mode(PgSslMode::Require)
            } else {
                info!("Connecting to PostgreSQL from DATABASE_URL");
                options
            }
        }
        DatabaseConfig::Discrete {
            host,
            port,
            name,
            user,
            password,
        } => {
            info!(host = %host, port = port, database = %name, "Connecting to local PostgreSQL");
            PgConnectOptions::new()
                .host(host)
                .port(*port)
                .database(name)
                .username(user)
                .password(password)
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await?;
    info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied");

    Ok(pool)
}

/// Maps a sqlx failure onto the API error taxonomy.
/// Unique-key violations become conflicts, everything else is terminal.
pub fn map_db_error(error: sqlx::Error, conflict_message: &str) -> AppError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.is_unique_violation() {
            warn!(constraint = ?db_error.constraint(), "Unique constraint violated");
            return AppError::Conflict(conflict_message.to_string());
        }
    }
    warn!(error = %error, "Database operation failed");
    AppError::DatabaseError(error.to_string())
}
