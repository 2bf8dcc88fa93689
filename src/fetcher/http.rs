//! Plain GET of the points table page.
//!
//! Only useful when the table is present in the server-rendered markup; no
//! scripts run, so there is no settle delay.

use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::debug;

use crate::config::{Config, NAVIGATION_TIMEOUT_SECS, POINTS_TABLE_SELECTOR};
use crate::error::{AppError, Result};
use crate::fetcher::PageSource;
use crate::types::FetchMethod;

pub struct HttpPageSource {
    client: reqwest::Client,
    target_url: String,
    selector: String,
}

impl HttpPageSource {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&cfg.user_agent)
            .timeout(Duration::from_secs(NAVIGATION_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            target_url: cfg.target_url.clone(),
            selector: POINTS_TABLE_SELECTOR.to_string(),
        })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self) -> Result<String> {
        let body = self
            .client
            .get(&self.target_url)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| self.classify(e))?
            .text()
            .await
            .map_err(|e| self.classify(e))?;

        debug!(url = %self.target_url, bytes = body.len(), "Fetched page");

        if !contains_selector(&body, &self.selector)? {
            return Err(AppError::ElementNotFound {
                selector: self.selector.clone(),
                timeout_secs: None,
            });
        }

        Ok(body)
    }

    fn method(&self) -> FetchMethod {
        FetchMethod::Http
    }
}

impl HttpPageSource {
    fn classify(&self, e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::NavigationTimeout {
                url: self.target_url.clone(),
                timeout_secs: NAVIGATION_TIMEOUT_SECS,
            }
        } else {
            AppError::Network(e)
        }
    }
}

fn contains_selector(html: &str, selector: &str) -> Result<bool> {
    let sel = Selector::parse(selector)
        .map_err(|e| AppError::Internal(format!("invalid CSS selector '{selector}': {e}")))?;
    Ok(Html::parse_document(html).select(&sel).next().is_some())
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, routing::get, Router};

    use super::*;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn source_for(url: String) -> HttpPageSource {
        let cfg = Config::from_lookup(|key| match key {
            "TARGET_URL" => Some(url.clone()),
            "FETCH_METHOD" => Some("http".to_string()),
            _ => None,
        })
        .unwrap();
        HttpPageSource::new(&cfg).unwrap()
    }

    #[tokio::test]
    async fn returns_markup_containing_the_table() {
        let app = Router::new().route(
            "/points-table/men",
            get(|| async {
                axum::response::Html(
                    r#"<table><tbody id="pointsdata"><tr><td>1</td></tr></tbody></table>"#,
                )
            }),
        );
        let base = serve(app).await;
        let source = source_for(format!("{base}/points-table/men"));

        let html = source.fetch().await.unwrap();
        assert!(html.contains("pointsdata"));
        assert_eq!(source.method(), FetchMethod::Http);
    }

    #[tokio::test]
    async fn missing_table_is_element_not_found() {
        let app = Router::new().route(
            "/points-table/men",
            get(|| async { axum::response::Html("<div id=\"app\"></div>") }),
        );
        let base = serve(app).await;
        let source = source_for(format!("{base}/points-table/men"));

        let err = source.fetch().await.unwrap_err();
        assert!(
            matches!(err, AppError::ElementNotFound { timeout_secs: None, .. }),
            "got {err:?}"
        );
        assert!(!err.to_string().contains("waited"), "{err}");
    }

    #[tokio::test]
    async fn error_status_is_network_error() {
        let app = Router::new().route(
            "/points-table/men",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );
        let base = serve(app).await;
        let source = source_for(format!("{base}/points-table/men"));

        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, AppError::Network(_)), "got {err:?}");
        assert!(err.is_fetch_error());
    }
}
