use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, instrument};

use super::models::SweepReport;
use super::store::TokenStore;
use crate::shared::AppError;

/// Configuration for the sweep task
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// How often expired codes and sessions are dropped
    pub sweep_interval: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(60 * 60), // hourly
        }
    }
}

/// Periodically sweeps the token store until `shutdown` flips to true
/// or its sender is dropped.
#[instrument(skip(token_store, shutdown))]
pub async fn start_sweep_task(
    token_store: Arc<dyn TokenStore + Send + Sync>,
    config: SweepConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(
        sweep_interval_secs = config.sweep_interval.as_secs(),
        "Starting token sweep background task"
    );

    let mut sweep_interval = interval(config.sweep_interval);
    sweep_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; nothing has expired yet at startup
    sweep_interval.tick().await;

    loop {
        tokio::select! {
            _ = sweep_interval.tick() => {
                match sweep_expired(&token_store).await {
                    Ok(report) => info!(
                        codes_removed = report.codes_removed,
                        sessions_removed = report.sessions_removed,
                        "Token sweep completed"
                    ),
                    Err(e) => error!(error = %e, "Token sweep failed"),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("Token sweep task stopping");
                    return;
                }
            }
        }
    }
}

/// Runs one sweep over the store
pub async fn sweep_expired(
    token_store: &Arc<dyn TokenStore + Send + Sync>,
) -> Result<SweepReport, AppError> {
    let report = token_store.sweep().await?;
    if report.total() == 0 {
        info!("No expired tokens to sweep");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verification::models::{VerificationCode, VerifiedSession};
    use crate::verification::store::InMemoryTokenStore;
    use chrono::Duration as ChronoDuration;

    fn store_with_stale_entries() -> Arc<InMemoryTokenStore> {
        Arc::new(
            InMemoryTokenStore::default()
                .with_codes(vec![VerificationCode::new(
                    "a@b.c".to_string(),
                    "123456".to_string(),
                    ChronoDuration::minutes(-1),
                )])
                .with_sessions(vec![VerifiedSession::new(
                    "s1".to_string(),
                    "a@b.c".to_string(),
                    ChronoDuration::hours(-1),
                )]),
        )
    }

    #[tokio::test]
    async fn test_sweep_expired_reports_removals() {
        let concrete = store_with_stale_entries();
        let store: Arc<dyn TokenStore + Send + Sync> = concrete.clone();

        let report = sweep_expired(&store).await.unwrap();
        assert_eq!(report.total(), 2);
        assert_eq!(concrete.code_count(), 0);
        assert_eq!(concrete.session_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_sweeps_on_interval_and_stops_on_shutdown() {
        let concrete = store_with_stale_entries();
        let store: Arc<dyn TokenStore + Send + Sync> = concrete.clone();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(start_sweep_task(
            store,
            SweepConfig {
                sweep_interval: Duration::from_secs(60),
            },
            shutdown_rx,
        ));

        // Nothing is swept on startup
        tokio::task::yield_now().await;
        assert_eq!(concrete.session_count(), 1);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(concrete.session_count(), 0);
        assert_eq!(concrete.code_count(), 0);

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_task_stops_when_sender_dropped() {
        let store: Arc<dyn TokenStore + Send + Sync> = Arc::new(InMemoryTokenStore::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(start_sweep_task(store, SweepConfig::default(), shutdown_rx));
        drop(shutdown_tx);

        handle.await.unwrap();
    }
}
