use std::time::Duration;

use crate::error::{AppError, Result};
use crate::retry::{Backoff, RetryPolicy};
use crate::types::FetchMethod;

pub const TARGET_URL: &str = "https://www.iplt20.com/points-table/men";

/// Element that appears once the client-side points table has rendered.
pub const POINTS_TABLE_SELECTOR: &str = "#pointsdata";

/// Rows of the points table fed to the extractor.
pub const POINTS_TABLE_ROWS_SELECTOR: &str = "#pointsdata tr";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Upper bound on page navigation (seconds).
pub const NAVIGATION_TIMEOUT_SECS: u64 = 30;

/// Upper bound on waiting for the points table element (seconds).
pub const ELEMENT_TIMEOUT_SECS: u64 = 15;

/// Extra wait after the element appears, for rendering the load signal misses.
pub const SETTLE_DELAY_MS: u64 = 3_000;

/// How often the browser fetcher re-checks for the points table element.
pub const ELEMENT_POLL_INTERVAL_MS: u64 = 250;

/// Network counts as idle once this many requests or fewer stay open for the window.
pub const NETWORK_IDLE_MAX_IN_FLIGHT: usize = 2;
pub const NETWORK_IDLE_WINDOW_MS: u64 = 500;

/// Cached scrape results older than this are refreshed.
pub const CACHE_TTL_SECS: u64 = 300;

pub const RETRY_MAX_ATTEMPTS: u32 = 3;
pub const RETRY_BASE_DELAY_MS: u64 = 1_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub api_port: u16,
    pub target_url: String,
    pub user_agent: String,
    /// Browser (rendered) or plain HTTP GET (FETCH_METHOD)
    pub fetch_method: FetchMethod,
    pub cache_ttl: Duration,
    pub retry: RetryPolicy,
    /// Explicit Chromium binary; auto-detected when unset (CHROME_EXECUTABLE)
    pub chrome_executable: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup, falling back to the compiled defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_attempts = lookup("RETRY_MAX_ATTEMPTS")
            .map(|v| {
                v.trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| {
                        AppError::Config("RETRY_MAX_ATTEMPTS must be a positive integer".to_string())
                    })
            })
            .transpose()?
            .unwrap_or(RETRY_MAX_ATTEMPTS);

        let cache_ttl_secs = lookup("CACHE_TTL_SECS")
            .map(|v| {
                v.trim().parse::<u64>().map_err(|_| {
                    AppError::Config("CACHE_TTL_SECS must be a non-negative integer".to_string())
                })
            })
            .transpose()?
            .unwrap_or(CACHE_TTL_SECS);

        let base_delay_ms = lookup("RETRY_BASE_DELAY_MS")
            .map(|v| {
                v.trim().parse::<u64>().map_err(|_| {
                    AppError::Config("RETRY_BASE_DELAY_MS must be a non-negative integer".to_string())
                })
            })
            .transpose()?
            .unwrap_or(RETRY_BASE_DELAY_MS);

        let backoff = match lookup("RETRY_BACKOFF") {
            Some(v) => v.parse::<Backoff>()?,
            None => Backoff::Exponential,
        };

        let fetch_method = match lookup("FETCH_METHOD") {
            Some(v) => v.parse::<FetchMethod>()?,
            None => FetchMethod::Browser,
        };

        Ok(Self {
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            api_port: lookup("API_PORT")
                .unwrap_or_else(|| "3000".to_string())
                .trim()
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            target_url: lookup("TARGET_URL").unwrap_or_else(|| TARGET_URL.to_string()),
            user_agent: lookup("USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            fetch_method,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            retry: RetryPolicy {
                max_attempts,
                base_delay: Duration::from_millis(base_delay_ms),
                backoff,
            },
            chrome_executable: lookup("CHROME_EXECUTABLE").filter(|s| !s.trim().is_empty()),
        })
    }
}
