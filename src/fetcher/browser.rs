//! Headless Chromium fetcher for the client-rendered points table.
//!
//! Each fetch launches its own browser process and closes it before
//! returning, whether the render succeeded or not.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::Page;
use futures_util::{Stream, StreamExt};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::config::{
    Config, ELEMENT_POLL_INTERVAL_MS, ELEMENT_TIMEOUT_SECS, NAVIGATION_TIMEOUT_SECS,
    NETWORK_IDLE_MAX_IN_FLIGHT, NETWORK_IDLE_WINDOW_MS, POINTS_TABLE_SELECTOR, SETTLE_DELAY_MS,
};
use crate::error::{AppError, Result};
use crate::fetcher::PageSource;
use crate::types::FetchMethod;

pub struct BrowserPageSource {
    target_url: String,
    selector: String,
    user_agent: String,
    chrome_executable: Option<String>,
    navigation_timeout: Duration,
    element_timeout: Duration,
    settle_delay: Duration,
}

impl BrowserPageSource {
    pub fn new(cfg: &Config) -> Self {
        Self {
            target_url: cfg.target_url.clone(),
            selector: POINTS_TABLE_SELECTOR.to_string(),
            user_agent: cfg.user_agent.clone(),
            chrome_executable: cfg.chrome_executable.clone(),
            navigation_timeout: Duration::from_secs(NAVIGATION_TIMEOUT_SECS),
            element_timeout: Duration::from_secs(ELEMENT_TIMEOUT_SECS),
            settle_delay: Duration::from_millis(SETTLE_DELAY_MS),
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(self.navigation_timeout)
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg(format!("--user-agent={}", self.user_agent));

        if let Some(path) = &self.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(AppError::Browser)
    }

    /// Navigate, wait for the table, settle, and capture the markup.
    async fn render(&self, browser: &Browser) -> Result<String> {
        let page = browser.new_page("about:blank").await.map_err(cdp_error)?;

        // Subscribed before navigating so no request of the load is missed.
        let sent = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(cdp_error)?;
        let finished = page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(cdp_error)?;
        let failed = page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(cdp_error)?;

        let navigate = async {
            page.goto(self.target_url.as_str()).await.map_err(cdp_error)?;
            wait_for_network_idle(sent, finished, failed).await;
            Ok::<_, AppError>(())
        };
        timeout(self.navigation_timeout, navigate)
            .await
            .map_err(|_| AppError::NavigationTimeout {
                url: self.target_url.clone(),
                timeout_secs: self.navigation_timeout.as_secs(),
            })??;
        debug!(url = %self.target_url, "Navigation complete; network idle");

        timeout(self.element_timeout, wait_for_element(&page, &self.selector))
            .await
            .map_err(|_| AppError::ElementNotFound {
                selector: self.selector.clone(),
                timeout_secs: Some(self.element_timeout.as_secs()),
            })?;
        debug!(selector = %self.selector, "Points table present; settling");

        sleep(self.settle_delay).await;

        page.content().await.map_err(cdp_error)
    }
}

#[async_trait]
impl PageSource for BrowserPageSource {
    async fn fetch(&self) -> Result<String> {
        let (mut browser, mut handler) = Browser::launch(self.browser_config()?)
            .await
            .map_err(cdp_error)?;

        // The CDP connection only makes progress while its handler is polled.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler event error: {e}");
                }
            }
        });

        let result = self.render(&browser).await;

        if let Err(e) = browser.close().await {
            warn!("Browser close failed: {e}");
        }
        if let Err(e) = browser.wait().await {
            warn!("Browser process wait failed: {e}");
        }
        handler_task.abort();

        match &result {
            Ok(html) => info!(bytes = html.len(), "Rendered points table page"),
            Err(e) => debug!("Render failed: {e}"),
        }
        result
    }

    fn method(&self) -> FetchMethod {
        FetchMethod::Browser
    }
}

async fn wait_for_element(page: &Page, selector: &str) {
    let poll = Duration::from_millis(ELEMENT_POLL_INTERVAL_MS);
    while page.find_element(selector).await.is_err() {
        sleep(poll).await;
    }
}

/// Requests the page has started but not yet finished or failed.
#[derive(Debug, Default)]
struct InflightRequests {
    pending: HashSet<String>,
}

impl InflightRequests {
    fn started(&mut self, request_id: &str) {
        self.pending.insert(request_id.to_string());
    }

    fn settled(&mut self, request_id: &str) {
        self.pending.remove(request_id);
    }

    fn is_idle(&self) -> bool {
        self.pending.len() <= NETWORK_IDLE_MAX_IN_FLIGHT
    }
}

/// Resolves once no more than [`NETWORK_IDLE_MAX_IN_FLIGHT`] requests have
/// been in flight for a full [`NETWORK_IDLE_WINDOW_MS`]. Any request event
/// restarts the window.
async fn wait_for_network_idle<S, F, X>(sent: S, finished: F, failed: X)
where
    S: Stream<Item = Arc<EventRequestWillBeSent>>,
    F: Stream<Item = Arc<EventLoadingFinished>>,
    X: Stream<Item = Arc<EventLoadingFailed>>,
{
    tokio::pin!(sent, finished, failed);
    let window = Duration::from_millis(NETWORK_IDLE_WINDOW_MS);
    let mut inflight = InflightRequests::default();

    loop {
        tokio::select! {
            Some(event) = sent.next() => inflight.started(event.request_id.inner()),
            Some(event) = finished.next() => inflight.settled(event.request_id.inner()),
            Some(event) = failed.next() => inflight.settled(event.request_id.inner()),
            _ = sleep(window) => {
                if inflight.is_idle() {
                    return;
                }
                debug!(pending = inflight.pending.len(), "Network still busy");
            }
        }
    }
}

fn cdp_error(e: chromiumoxide::error::CdpError) -> AppError {
    AppError::Browser(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_tolerates_two_open_requests() {
        let mut inflight = InflightRequests::default();
        assert!(inflight.is_idle());

        inflight.started("1");
        inflight.started("2");
        assert!(inflight.is_idle());

        inflight.started("3");
        assert!(!inflight.is_idle());

        inflight.settled("1");
        assert!(inflight.is_idle());
    }

    #[test]
    fn redirects_reuse_the_request_id() {
        let mut inflight = InflightRequests::default();
        for id in ["a", "a", "a", "b", "c"] {
            inflight.started(id);
        }
        assert_eq!(inflight.pending.len(), 3);

        inflight.settled("a");
        inflight.settled("unknown");
        assert_eq!(inflight.pending.len(), 2);
        assert!(inflight.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_wait_needs_a_quiet_window() {
        use futures_util::stream;
        use tokio::time::Instant;

        let started = Instant::now();
        wait_for_network_idle(
            stream::pending::<Arc<EventRequestWillBeSent>>(),
            stream::pending::<Arc<EventLoadingFinished>>(),
            stream::pending::<Arc<EventLoadingFailed>>(),
        )
        .await;
        assert_eq!(
            started.elapsed(),
            Duration::from_millis(NETWORK_IDLE_WINDOW_MS)
        );
    }
}
