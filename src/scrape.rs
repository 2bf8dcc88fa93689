//! Cache-fronted scrape pipeline: fetch → extract → assemble → cache.

use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::config::POINTS_TABLE_ROWS_SELECTOR;
use crate::error::{AppError, Result};
use crate::fallback;
use crate::fetcher::PageSource;
use crate::parser::{self, ExtractedTable};
use crate::retry::RetryPolicy;
use crate::state::ResultCache;
use crate::types::{FetchMethod, ScrapeResult, ScrapeSnapshot};

/// A snapshot and whether it was served from the cache.
#[derive(Debug, Clone)]
pub struct Served {
    pub snapshot: Arc<ScrapeSnapshot>,
    pub cached: bool,
}

pub struct ScrapeService {
    source: Arc<dyn PageSource>,
    cache: Arc<dyn ResultCache>,
    retry: RetryPolicy,
    rows_selector: String,
    /// Held for the duration of a refresh so concurrent misses fetch once.
    refresh_lock: tokio::sync::Mutex<()>,
    /// Bumped on every invalidation; refreshes that straddle one skip the write.
    generation: Mutex<u64>,
    health: Arc<HealthState>,
    latency: Arc<LatencyStats>,
}

impl ScrapeService {
    pub fn new(
        source: Arc<dyn PageSource>,
        cache: Arc<dyn ResultCache>,
        retry: RetryPolicy,
        health: Arc<HealthState>,
        latency: Arc<LatencyStats>,
    ) -> Arc<Self> {
        Arc::new(Self {
            source,
            cache,
            retry,
            rows_selector: POINTS_TABLE_ROWS_SELECTOR.to_string(),
            refresh_lock: tokio::sync::Mutex::new(()),
            generation: Mutex::new(0),
            health,
            latency,
        })
    }

    pub fn cache(&self) -> &Arc<dyn ResultCache> {
        &self.cache
    }

    /// Serve from cache, refreshing on a miss.
    ///
    /// The refresh runs on its own task: a caller that goes away does not
    /// cancel it, and the result still lands in the cache.
    pub async fn get(self: &Arc<Self>) -> Result<Served> {
        if let Some(snapshot) = self.cache.read() {
            debug!("Serving cached scrape result");
            self.health.inc_cache_hits();
            return Ok(Served {
                snapshot,
                cached: true,
            });
        }

        let service = Arc::clone(self);
        tokio::spawn(async move { service.refresh().await })
            .await
            .map_err(|e| AppError::Internal(format!("scrape task failed: {e}")))?
    }

    /// Empty the cache. Any refresh already in flight will not repopulate it.
    pub fn invalidate(&self) {
        let mut generation = self.generation.lock().unwrap_or_else(|e| e.into_inner());
        *generation += 1;
        self.cache.invalidate();
        info!(generation = *generation, "Scrape cache cleared");
    }

    async fn refresh(&self) -> Result<Served> {
        let _guard = self.refresh_lock.lock().await;

        // Another request may have refreshed while this one queued.
        if let Some(snapshot) = self.cache.read() {
            self.health.inc_cache_hits();
            return Ok(Served {
                snapshot,
                cached: true,
            });
        }

        let started_generation = self.current_generation();
        let started = Instant::now();
        let snapshot = Arc::new(self.scrape().await);
        self.latency.record(started.elapsed());
        self.health.record_scrape(snapshot.degraded, now_ms());

        {
            let generation = self.generation.lock().unwrap_or_else(|e| e.into_inner());
            if *generation == started_generation {
                self.cache.write(Arc::clone(&snapshot));
            } else {
                info!("Cache invalidated during refresh; result not cached");
            }
        }

        Ok(Served {
            snapshot,
            cached: false,
        })
    }

    /// Fetch and extract with retries. Never fails: exhaustion yields fallback data.
    async fn scrape(&self) -> ScrapeSnapshot {
        let method = self.source.method();
        let label = method.to_string();

        let outcome = self
            .retry
            .run(&label, move |attempt| async move {
                debug!(attempt, %method, "Fetching points table");
                let html = self.source.fetch().await?;
                parser::extract_html(&html, &self.rows_selector)
            })
            .await;

        match outcome {
            Ok(table) => {
                for row in table.standings.iter().filter(|r| !r.is_consistent()) {
                    warn!(
                        team = %row.team,
                        matches = row.matches,
                        "Scraped row has more results than matches played",
                    );
                }
                let snapshot = assemble(table, method);
                if snapshot.degraded {
                    warn!("Points table had no team rows; serving fallback standings");
                } else {
                    info!(
                        teams = snapshot.data.points_table.len(),
                        rows = snapshot.data.points_table_raw_data.len(),
                        %method,
                        "Scraped points table",
                    );
                }
                snapshot
            }
            Err(e) => {
                warn!(%method, "Scrape failed, serving fallback data: {e}");
                ScrapeSnapshot {
                    data: fallback::fallback_result(),
                    degraded: true,
                    method,
                }
            }
        }
    }

    fn current_generation(&self) -> u64 {
        *self.generation.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Combine scraped standings with the static match listings.
fn assemble(table: ExtractedTable, method: FetchMethod) -> ScrapeSnapshot {
    let degraded = table.standings.is_empty();
    let points_table = if degraded {
        fallback::standings()
    } else {
        table.standings
    };

    ScrapeSnapshot {
        data: ScrapeResult {
            live_match: Some(fallback::live_match()),
            upcoming_matches: fallback::upcoming_matches(),
            points_table,
            points_table_raw_data: table.raw,
            recent_matches: fallback::recent_matches(),
            last_updated: fallback::now_iso(),
        },
        degraded,
        method,
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
