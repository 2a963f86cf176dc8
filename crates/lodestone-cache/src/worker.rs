//! Background worker that purges expired cache entries on a schedule

use crate::TtlCache;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

/// Periodically calls [`TtlCache::purge_expired`] on one cache
///
/// Reads never depend on the sweep: expired entries are already invisible.
/// The worker only reclaims their memory.
///
/// # Examples
///
/// ```no_run
/// use lodestone_cache::{CacheConfig, SweepWorker, TtlCache};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() {
///     let cache: Arc<TtlCache<String, String>> =
///         Arc::new(TtlCache::new(CacheConfig::profile_details()));
///
///     // Sweeps every 30 minutes until the handle is aborted
///     let handle = SweepWorker::spawn(cache.clone());
///     assert!(handle.is_some());
/// }
/// ```
pub struct SweepWorker<V, E> {
    cache: Arc<TtlCache<V, E>>,
    interval: Duration,
}

impl<V, E> SweepWorker<V, E> {
    /// Create a worker for a cache, or `None` if its sweep is disabled
    pub fn new(cache: Arc<TtlCache<V, E>>) -> Option<Self> {
        let interval = cache.config().sweep_interval?;
        if interval.is_zero() {
            tracing::warn!(cache = %cache.name(), "Zero sweep interval, sweeping disabled");
            return None;
        }
        Some(Self { cache, interval })
    }

    /// Sweep interval of this worker
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run the worker indefinitely
    ///
    /// The first sweep happens one interval after start.
    pub async fn run(self) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            cache = %self.cache.name(),
            "Sweep worker started (interval: {:?})",
            self.interval
        );

        loop {
            ticker.tick().await;
            self.sweep_once();
        }
    }

    /// Run for a specific number of cycles (useful for testing)
    pub async fn run_cycles(&self, cycles: usize) -> usize {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        let mut total = 0;

        for cycle in 0..cycles {
            ticker.tick().await;
            tracing::debug!("Starting sweep cycle {}/{}", cycle + 1, cycles);
            total += self.sweep_once();
        }

        tracing::info!(
            cache = %self.cache.name(),
            "Sweep worker finished {} cycles, {} entries purged",
            cycles,
            total
        );
        total
    }

    fn sweep_once(&self) -> usize {
        let purged = self.cache.purge_expired();
        if purged > 0 {
            tracing::info!(cache = %self.cache.name(), purged, "Sweep completed");
        } else {
            tracing::debug!(cache = %self.cache.name(), "Sweep completed, nothing expired");
        }
        purged
    }
}

impl<V, E> SweepWorker<V, E>
where
    V: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Spawn a sweep task for a cache, or return `None` if its sweep is disabled
    ///
    /// The task runs until its handle is aborted.
    pub fn spawn(cache: Arc<TtlCache<V, E>>) -> Option<JoinHandle<()>> {
        Self::new(cache).map(|worker| tokio::spawn(worker.run()))
    }
}
