use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("browser not available at {endpoint}: {reason}")]
    Unavailable { endpoint: String, reason: String },

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("CDP error from {method}: {message} (code: {code})")]
    Protocol {
        method: String,
        code: i64,
        message: String,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid response to {method}: {reason}")]
    InvalidResponse { method: String, reason: String },

    #[error("navigation to {url} failed: {reason}")]
    NavigationFailed { url: String, reason: String },

    #[error("element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("timed out after {after_ms}ms waiting for {what}")]
    Timeout { what: String, after_ms: u64 },

    #[error("browser session closed")]
    SessionClosed,

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("screenshot payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
}

impl BrowserError {
    /// `true` for failures caused by the page being slow or flaky rather than
    /// by the session being unusable.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BrowserError::Timeout { .. } | BrowserError::NavigationFailed { .. }
        )
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for BrowserError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        BrowserError::WebSocket(e.to_string())
    }
}
