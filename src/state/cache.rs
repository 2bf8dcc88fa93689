use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use crate::types::ScrapeSnapshot;

/// Storage for the latest scrape result, injected into the scrape pipeline.
pub trait ResultCache: Send + Sync {
    /// The stored snapshot, if one exists and is younger than the TTL.
    fn read(&self) -> Option<Arc<ScrapeSnapshot>>;

    /// Replace the stored snapshot, stamping it with the current time.
    fn write(&self, snapshot: Arc<ScrapeSnapshot>);

    /// Drop the stored snapshot; the next read misses.
    fn invalidate(&self);

    /// Age of the stored snapshot, stale or not.
    fn age(&self) -> Option<Duration>;
}

struct CacheEntry {
    snapshot: Arc<ScrapeSnapshot>,
    fetched_at: Instant,
}

/// Process-local single-slot cache.
pub struct MemoryCache {
    slot: Mutex<Option<CacheEntry>>,
    ttl: Duration,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            ttl,
        }
    }
}

impl ResultCache for MemoryCache {
    fn read(&self) -> Option<Arc<ScrapeSnapshot>> {
        let guard = self.slot.lock().ok()?;
        let entry = guard.as_ref()?;
        if entry.fetched_at.elapsed() < self.ttl {
            Some(Arc::clone(&entry.snapshot))
        } else {
            None
        }
    }

    fn write(&self, snapshot: Arc<ScrapeSnapshot>) {
        if let Ok(mut guard) = self.slot.lock() {
            *guard = Some(CacheEntry {
                snapshot,
                fetched_at: Instant::now(),
            });
        }
    }

    fn invalidate(&self) {
        if let Ok(mut guard) = self.slot.lock() {
            *guard = None;
        }
    }

    fn age(&self) -> Option<Duration> {
        let guard = self.slot.lock().ok()?;
        guard.as_ref().map(|entry| entry.fetched_at.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback;
    use crate::types::FetchMethod;

    const TTL: Duration = Duration::from_secs(300);

    fn snapshot(team: &str) -> Arc<ScrapeSnapshot> {
        let mut data = fallback::fallback_result();
        data.points_table[0].team = team.to_string();
        Arc::new(ScrapeSnapshot {
            data,
            degraded: false,
            method: FetchMethod::Http,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn empty_cache_misses() {
        let cache = MemoryCache::new(TTL);
        assert!(cache.read().is_none());
        assert!(cache.age().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn read_after_write_returns_payload() {
        let cache = MemoryCache::new(TTL);
        let snap = snapshot("Mumbai Indians");
        cache.write(Arc::clone(&snap));

        let hit = cache.read().expect("fresh entry");
        assert!(Arc::ptr_eq(&hit, &snap));
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_at_ttl() {
        let cache = MemoryCache::new(TTL);
        cache.write(snapshot("A"));

        tokio::time::advance(TTL - Duration::from_millis(1)).await;
        assert!(cache.read().is_some(), "still fresh 1ms before TTL");

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(cache.read().is_none(), "stale exactly at TTL");
        assert_eq!(cache.age(), Some(TTL));
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_always_misses() {
        let cache = MemoryCache::new(TTL);
        cache.write(snapshot("A"));
        cache.write(snapshot("B"));
        cache.invalidate();

        assert!(cache.read().is_none());
        assert!(cache.age().is_none());

        cache.invalidate();
        assert!(cache.read().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn rewrite_resets_the_clock() {
        let cache = MemoryCache::new(TTL);
        cache.write(snapshot("A"));
        tokio::time::advance(Duration::from_secs(200)).await;
        cache.write(snapshot("B"));
        tokio::time::advance(Duration::from_secs(200)).await;

        let hit = cache.read().expect("second write is 200s old");
        assert_eq!(hit.data.points_table[0].team, "B");
    }
}
