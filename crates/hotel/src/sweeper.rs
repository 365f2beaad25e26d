//! Background expiration of stale holds.

use std::time::Duration;

use chrono::Utc;

use crate::Result;
use crate::store::HotelStore;

/// Default cadence of the expiration sweep.
pub const DEFAULT_SWEEP_INTERVAL_SECONDS: u64 = 30;

/// Default age after which terminal locks are deleted.
pub const DEFAULT_RETENTION_DAYS: i64 = 30;

/// Outcome of a single sweep pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Stale holds transitioned to `Expired`.
    pub expired: usize,
    /// Old terminal rows deleted by retention.
    pub purged: u64,
}

/// Periodically expires stale holds and prunes old terminal locks.
///
/// The sweeper is the correctness backstop for failed saga compensation: if
/// the booking service crashes between hold and release, the hold's interval
/// becomes free again at most `hold_ttl + sweep_interval` later.
pub struct ExpirationSweeper<S> {
    store: S,
    interval: Duration,
    retention: chrono::Duration,
}

impl<S: HotelStore + Clone + Send + Sync + 'static> ExpirationSweeper<S> {
    /// Creates a sweeper with the given cadence and retention window.
    pub fn new(store: S, interval: Duration, retention: chrono::Duration) -> Self {
        Self {
            store,
            interval,
            retention,
        }
    }

    /// Creates a sweeper with the default cadence and retention.
    pub fn with_defaults(store: S) -> Self {
        Self::new(
            store,
            Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECONDS),
            chrono::Duration::days(DEFAULT_RETENTION_DAYS),
        )
    }

    /// Runs one sweep pass: expire due holds, prune old terminal rows, and
    /// refresh the per-status lock gauges.
    #[tracing::instrument(skip(self))]
    pub async fn run_once(&self) -> Result<SweepReport> {
        let now = Utc::now();

        let expired = self.store.expire_due_locks(now).await?;
        for lock in &expired {
            tracing::info!(
                lock_id = %lock.id,
                request_id = %lock.request_id,
                room_id = %lock.room_id,
                "hold expired"
            );
        }
        if !expired.is_empty() {
            metrics::counter!("locks_expired_total").increment(expired.len() as u64);
        }

        let purged = self
            .store
            .purge_terminal_locks_before(now - self.retention)
            .await?;
        if purged > 0 {
            metrics::counter!("locks_purged_total").increment(purged);
            tracing::debug!(purged, "old terminal locks pruned");
        }

        for (status, count) in self.store.count_locks_by_status().await? {
            metrics::gauge!("room_locks", "status" => status.as_str()).set(count as f64);
        }

        Ok(SweepReport {
            expired: expired.len(),
            purged,
        })
    }

    /// Spawns the sweep loop on the runtime. Abort the returned handle to
    /// stop it.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // the first tick fires immediately; expire anything stale from a
            // previous run before settling into the cadence
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_once().await {
                    tracing::error!(error = %e, "sweep pass failed");
                }
            }
        })
    }
}
