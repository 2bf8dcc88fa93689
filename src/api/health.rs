//! Shared counters for the /health endpoint.
//! Updated by ScrapeService, read by the API.

use std::sync::atomic::{AtomicU64, Ordering};

/// Scrape pipeline counters.
#[derive(Default)]
pub struct HealthState {
    /// Refreshes that ran the fetch pipeline (live or fallback).
    pub scrapes_total: AtomicU64,
    /// Refreshes that served fallback standings.
    pub fallbacks_total: AtomicU64,
    /// GETs answered from the cache.
    pub cache_hits_total: AtomicU64,
    /// Unix milliseconds of the last refresh with live standings (0 = none).
    pub last_success_at_ms: AtomicU64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_scrape(&self, degraded: bool, at_ms: u64) {
        self.scrapes_total.fetch_add(1, Ordering::Relaxed);
        if degraded {
            self.fallbacks_total.fetch_add(1, Ordering::Relaxed);
        } else {
            self.last_success_at_ms.store(at_ms, Ordering::Relaxed);
        }
    }

    pub fn inc_cache_hits(&self) {
        self.cache_hits_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn scrapes_total(&self) -> u64 {
        self.scrapes_total.load(Ordering::Relaxed)
    }

    pub fn fallbacks_total(&self) -> u64 {
        self.fallbacks_total.load(Ordering::Relaxed)
    }

    pub fn cache_hits_total(&self) -> u64 {
        self.cache_hits_total.load(Ordering::Relaxed)
    }

    pub fn last_success_at_ms(&self) -> Option<u64> {
        match self.last_success_at_ms.load(Ordering::Relaxed) {
            0 => None,
            ms => Some(ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_live_and_degraded_scrapes() {
        let health = HealthState::new();
        assert_eq!(health.last_success_at_ms(), None);

        health.record_scrape(false, 1_700_000_000_000);
        health.record_scrape(true, 1_700_000_300_000);
        health.inc_cache_hits();

        assert_eq!(health.scrapes_total(), 2);
        assert_eq!(health.fallbacks_total(), 1);
        assert_eq!(health.cache_hits_total(), 1);
        assert_eq!(health.last_success_at_ms(), Some(1_700_000_000_000));
    }
}
