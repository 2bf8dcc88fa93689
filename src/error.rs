use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Navigation to {url} timed out after {timeout_secs}s")]
    NavigationTimeout { url: String, timeout_secs: u64 },

    /// `timeout_secs` is `None` when the markup was checked once without waiting.
    #[error("Element '{selector}' not found{}", waited(.timeout_secs))]
    ElementNotFound {
        selector: String,
        timeout_secs: Option<u64>,
    },

    #[error("HTTP request error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        attempts: u32,
        last_error: Box<AppError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// True for failures raised while fetching the page. These are retried and
    /// ultimately degrade to fallback data instead of reaching the client.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            AppError::NavigationTimeout { .. }
                | AppError::ElementNotFound { .. }
                | AppError::Network(_)
                | AppError::Browser(_)
                | AppError::RetriesExhausted { .. }
        )
    }
}

fn waited(timeout_secs: &Option<u64>) -> String {
    match timeout_secs {
        Some(secs) => format!(" (waited {secs}s)"),
        None => " in page markup".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({
            "success": false,
            "error": self.to_string(),
        });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_not_found_mentions_wait_only_when_one_happened() {
        let polled = AppError::ElementNotFound {
            selector: "#pointsdata".to_string(),
            timeout_secs: Some(15),
        };
        assert_eq!(
            polled.to_string(),
            "Element '#pointsdata' not found (waited 15s)"
        );

        let static_check = AppError::ElementNotFound {
            selector: "#pointsdata".to_string(),
            timeout_secs: None,
        };
        assert_eq!(
            static_check.to_string(),
            "Element '#pointsdata' not found in page markup"
        );
    }
}
