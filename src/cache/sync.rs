use chrono::{Duration as ChronoDuration, Local};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use crate::cache::store::CacheStore;
use crate::error::StoreError;
use crate::store::BackingStore;

/// Performs the full resync from the backing store: bulk-loads everything,
/// builds a replacement snapshot off to the side, then swaps it in under a
/// short write lock. Single-flight: overlapping triggers are skipped.
pub struct Synchronizer {
    store: Arc<dyn BackingStore>,
    cache: Arc<RwLock<CacheStore>>,
    syncing: AtomicBool,
    lookback_days: i64,
}

impl Synchronizer {
    pub fn new(
        store: Arc<dyn BackingStore>,
        cache: Arc<RwLock<CacheStore>>,
        lookback_days: i64,
    ) -> Self {
        Self { store, cache, syncing: AtomicBool::new(false), lookback_days }
    }

    /// Runs one full resync. A failure keeps the previous snapshot in
    /// place; the caller (startup or the timer task) decides whether the
    /// error matters.
    pub async fn sync_all(&self) -> Result<(), StoreError> {
        if self.syncing.swap(true, Ordering::SeqCst) {
            debug!("resync already in progress; skipping trigger");
            return Ok(());
        }

        let result = self.rebuild().await;
        self.syncing.store(false, Ordering::SeqCst);

        match result {
            Ok(next) => {
                let stats = next.stats();
                *self.cache.write().expect("cache lock poisoned") = next;
                info!(
                    employees = stats.employees,
                    departments = stats.departments,
                    rules = stats.rules,
                    attendance_days = stats.attendance_days,
                    leave_days = stats.leave_days,
                    "cache resync complete"
                );
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "cache resync failed; keeping previous snapshot");
                Err(e)
            }
        }
    }

    async fn rebuild(&self) -> Result<CacheStore, StoreError> {
        let since = Local::now().date_naive() - ChronoDuration::days(self.lookback_days);

        let employees = self.store.load_employees().await?;
        let departments = self.store.load_departments().await?;
        let rules = self.store.load_rules().await?;
        let punches = self.store.load_punches(since).await?;
        let leaves = self.store.load_leaves(since).await?;

        Ok(CacheStore::build(employees, departments, rules, punches, leaves))
    }
}
