//! Error types for alert fetching.

use thiserror::Error;

/// Alert fetch errors.
///
/// Both variants are transient from the poll loop's point of view: the
/// cycle is skipped and the next one tries again.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure: DNS, connect, timeout, or a non-success status
    #[error("Network error: {message}")]
    Network {
        message: String,
        /// HTTP status, when the server answered at all
        status: Option<u16>,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The body was not a valid GeoJSON FeatureCollection
    #[error("Invalid alert feed: {message}")]
    Parse {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The HTTP client could not be constructed
    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),
}

impl FetchError {
    /// Create a network error for a non-success HTTP status.
    pub fn http_status(status: u16, body: &str) -> Self {
        let snippet: String = body.chars().take(200).collect();
        Self::Network {
            message: format!("HTTP {status}: {snippet}"),
            status: Some(status),
            source: None,
        }
    }

    /// Create a parse error without an underlying JSON error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// Check if this error is a network-related error.
    pub fn is_network_error(&self) -> bool {
        matches!(self, FetchError::Network { .. })
    }

    /// Check if this error is a malformed-response error.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, FetchError::Parse { .. })
    }

    /// Check if the request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Network { source: Some(e), .. } if e.is_timeout())
    }

    /// HTTP status of the failed response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Network { status, .. } => *status,
            _ => None,
        }
    }

    /// Get a user-friendly error message.
    pub fn friendly_message(&self) -> String {
        match self {
            FetchError::Network { status: Some(403), .. } => {
                "The alert API refused the request. Set a user_agent with contact info.".to_string()
            }
            FetchError::Network { status: Some(code), .. } if *code >= 500 => {
                format!("The alert API is having trouble (HTTP {code}). Will retry next cycle.")
            }
            FetchError::Network { .. } if self.is_timeout() => {
                "Alert request timed out. Will retry next cycle.".to_string()
            }
            FetchError::Network { message, .. } => {
                format!("Could not reach the alert API: {message}")
            }
            FetchError::Parse { message, .. } => {
                format!("The alert API returned an unexpected response: {message}")
            }
            FetchError::ClientBuild(msg) => format!("HTTP client setup failed: {msg}"),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            "request timed out"
        } else if e.is_connect() {
            "connection failed"
        } else if e.is_body() || e.is_decode() {
            "failed reading response body"
        } else {
            "request failed"
        };
        FetchError::Network {
            message: format!("{kind}: {e}"),
            status: e.status().map(|s| s.as_u16()),
            source: Some(e),
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Parse {
            message: e.to_string(),
            source: Some(e),
        }
    }
}

/// Result type for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;
