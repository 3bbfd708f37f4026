// cache.rs - Short-lived in-memory summary cache
// Entries expire after a TTL. Expired entries are dropped lazily on lookup and
// by a background sweep task, so idle keys do not accumulate between lookups.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use log::{debug, info};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

pub const DEFAULT_TTL: Duration = Duration::from_millis(3_600_000);
pub const SWEEP_INTERVAL: Duration = Duration::from_millis(300_000);

#[derive(Debug, Clone)]
struct CacheEntry {
    summary: String,
    created_at: Instant,
}

#[derive(Debug)]
pub struct SummaryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl SummaryCache {
    /// Creates a cache without a background sweep; expiry is lazy only.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            sweeper: Mutex::new(None),
        }
    }

    /// Creates a cache and starts its periodic sweep. Must be called from
    /// within a tokio runtime.
    pub fn with_sweeper(ttl: Duration, every: Duration) -> Arc<Self> {
        let cache = Arc::new(Self::new(ttl));
        cache.start_sweeper(every);
        cache
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, video_id: &str) -> Option<String> {
        let mut entries = self.lock_entries();
        let expired = match entries.get(video_id) {
            None => return None,
            Some(entry) => self.is_expired(entry, Instant::now()),
        };

        if expired {
            debug!("🗑️ Cache entry for {} expired on lookup", video_id);
            entries.remove(video_id);
            return None;
        }

        entries.get(video_id).map(|entry| entry.summary.clone())
    }

    pub fn has(&self, video_id: &str) -> bool {
        self.get(video_id).is_some()
    }

    pub fn set(&self, video_id: &str, summary: impl Into<String>) {
        let entry = CacheEntry {
            summary: summary.into(),
            created_at: Instant::now(),
        };
        self.lock_entries().insert(video_id.to_string(), entry);
    }

    pub fn clear(&self) {
        self.lock_entries().clear();
    }

    /// Number of stored entries, expired or not.
    pub fn size(&self) -> usize {
        self.lock_entries().len()
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock_entries();
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        before - entries.len()
    }

    /// Starts the periodic sweep, replacing any running one. The task only
    /// holds a weak reference and exits once the cache is gone.
    pub fn start_sweeper(self: &Arc<Self>, every: Duration) {
        let cache: Weak<Self> = Arc::downgrade(self);

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let removed = cache.purge_expired();
                if removed > 0 {
                    debug!("🧹 Cache sweep removed {} expired summaries", removed);
                }
            }
        });

        if let Some(previous) = self.lock_sweeper().replace(handle) {
            previous.abort();
        }
    }

    pub fn stop_sweeper(&self) {
        if let Some(handle) = self.lock_sweeper().take() {
            handle.abort();
            info!("⏹️ Summary cache sweep stopped");
        }
    }

    fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.created_at) > self.ttl
    }

    // A poisoned lock only means another thread panicked mid-insert; the map
    // itself is still usable.
    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_sweeper(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.sweeper.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for SummaryCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl Drop for SummaryCache {
    fn drop(&mut self) {
        if let Some(handle) = self.lock_sweeper().take() {
            handle.abort();
        }
    }
}
