//! Periodic eviction of finished jobs.
//!
//! Removes completed, failed and cancelled jobs whose `completed_at` is
//! older than the retention window. Queued and running jobs are never
//! touched. Runs on a fixed interval using `tokio::time::interval`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::registry::JobRegistry;

/// Default retention for finished jobs: 60 minutes.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60 * 60);

/// How often the sweep runs by default.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Run the sweep loop until `cancel` is triggered.
pub async fn run(
    registry: Arc<JobRegistry>,
    retention: Duration,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        retention_secs = retention.as_secs(),
        interval_secs = interval.as_secs(),
        "Job sweeper started"
    );

    // `interval` panics on a zero period.
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Job sweeper stopping");
                break;
            }
            _ = ticker.tick() => {
                let removed = sweep_once(&registry, retention);
                if removed > 0 {
                    tracing::info!(removed, remaining = registry.len(), "Job sweeper: evicted expired jobs");
                } else {
                    tracing::debug!("Job sweeper: nothing to evict");
                }
            }
        }
    }
}

/// Evict jobs that finished more than `retention` ago.
pub fn sweep_once(registry: &JobRegistry, retention: Duration) -> usize {
    let Ok(retention) = chrono::Duration::from_std(retention) else {
        return 0;
    };
    match Utc::now().checked_sub_signed(retention) {
        Some(cutoff) => registry.remove_expired(cutoff),
        None => 0,
    }
}
