//! Startup sequence: wait for the database, then ensure the schema.

use std::time::Duration;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::StartupError;
use crate::store::InspectionStore;

/// Retry policy for the startup liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectRetry {
    /// Probes attempted before giving up.
    pub max_attempts: u32,
    /// Delay between probes in milliseconds.
    pub interval_ms: u64,
}

impl Default for ConnectRetry {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval_ms: 1000,
        }
    }
}

impl ConnectRetry {
    /// Create from config values.
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.db_connect_attempts,
            interval_ms: config.db_connect_interval_ms,
        }
    }

    /// Delay between probes.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Probe the store until it answers or the attempt budget runs out.
///
/// Each failed probe is logged with its attempt number and reason. There is
/// no delay after the final failure.
pub async fn ensure_reachable<S>(store: &S, retry: &ConnectRetry) -> Result<(), StartupError>
where
    S: InspectionStore + ?Sized,
{
    let max_attempts = retry.max_attempts.max(1);
    let mut reason = String::new();

    for attempt in 1..=max_attempts {
        match store.ping().await {
            Ok(()) => {
                info!(attempt, "Database reachable");
                return Ok(());
            }
            Err(e) => {
                reason = e.to_string();
                warn!(
                    attempt,
                    max_attempts,
                    error = %e,
                    "Database not ready"
                );
            }
        }

        if attempt < max_attempts {
            tokio::time::sleep(retry.interval()).await;
        }
    }

    Err(StartupError::DependencyUnreachable {
        attempts: max_attempts,
        reason,
    })
}

/// Run the guard and then the schema initializer, strictly in order.
pub async fn prepare_store<S>(store: &S, retry: &ConnectRetry) -> Result<(), StartupError>
where
    S: InspectionStore + ?Sized,
{
    ensure_reachable(store, retry).await?;
    store.ensure_schema().await.map_err(StartupError::Schema)?;
    info!("Schema ready");
    Ok(())
}
