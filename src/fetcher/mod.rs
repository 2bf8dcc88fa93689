//! Page sources: where the points table markup comes from.

#[cfg(feature = "browser")]
pub mod browser;
pub mod http;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::Result;
use crate::types::FetchMethod;

#[cfg(feature = "browser")]
pub use browser::BrowserPageSource;
pub use http::HttpPageSource;

/// Produces the full markup of the points table page.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// One fetch attempt. Retrying is the caller's concern.
    async fn fetch(&self) -> Result<String>;

    fn method(&self) -> FetchMethod;
}

/// Build the page source selected by `cfg.fetch_method`.
pub fn build_source(cfg: &Config) -> Result<Arc<dyn PageSource>> {
    match cfg.fetch_method {
        FetchMethod::Http => Ok(Arc::new(HttpPageSource::new(cfg)?)),
        #[cfg(feature = "browser")]
        FetchMethod::Browser => Ok(Arc::new(BrowserPageSource::new(cfg))),
        #[cfg(not(feature = "browser"))]
        FetchMethod::Browser => Err(crate::error::AppError::Config(
            "FETCH_METHOD=browser requires the 'browser' feature; use FETCH_METHOD=http".to_string(),
        )),
    }
}
