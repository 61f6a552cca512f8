use chrono::Duration as ChronoDuration;
use parcel_tracker::{
    auth::TokenConfig,
    build_router,
    config::AppConfig,
    database,
    package::{InMemoryPackageRepository, PackageRepository, PostgresPackageRepository},
    user::{InMemoryUserRepository, PostgresUserRepository, UserRepository},
    verification::{
        start_sweep_task, CodeNotifier, InMemoryTokenStore, LoggingCodeNotifier, SweepConfig,
        TokenPolicy, TokenStore,
    },
    AppState, StorageBackend,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Repositories = (
    Arc<dyn UserRepository + Send + Sync>,
    Arc<dyn PackageRepository + Send + Sync>,
);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parcel_tracker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting parcel tracking server");

    let config = AppConfig::from_env()?;

    let (user_repository, package_repository): Repositories = match config.storage {
        StorageBackend::Postgres => {
            let pool = database::connect(&config.database).await?;
            (
                Arc::new(PostgresUserRepository::new(pool.clone())),
                Arc::new(PostgresPackageRepository::new(pool)),
            )
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage; data is lost on restart");
            (
                Arc::new(InMemoryUserRepository::new()),
                Arc::new(InMemoryPackageRepository::new()),
            )
        }
    };

    let token_store: Arc<dyn TokenStore + Send + Sync> =
        Arc::new(InMemoryTokenStore::new(TokenPolicy {
            code_ttl: ChronoDuration::minutes(config.auth.code_ttl_minutes),
            session_ttl: ChronoDuration::hours(config.auth.session_ttl_hours),
        }));
    let notifier: Arc<dyn CodeNotifier> = Arc::new(LoggingCodeNotifier);

    let app_state = AppState::new(
        user_repository,
        package_repository,
        Arc::clone(&token_store),
        notifier,
        TokenConfig::new(config.jwt_secret.clone(), config.auth.credential_ttl_hours),
        config.service_settings(),
    );

    // Background sweep of expired codes and verified sessions
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweep_task = tokio::spawn(start_sweep_task(
        token_store,
        SweepConfig {
            sweep_interval: config.auth.sweep_interval,
        },
        shutdown_rx,
    ));

    let app = build_router(app_state, Some(&config.cors_origin));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(
        port = config.port,
        storage = config.storage.as_str(),
        "Server running on http://localhost:{}",
        config.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, stopping background tasks");
    // The task also exits if the sender is gone
    let _ = shutdown_tx.send(true);
    sweep_task.await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
