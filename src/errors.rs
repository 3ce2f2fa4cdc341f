use thiserror::Error;

/// Result type alias for Devo Alerts API operations
pub type Result<T> = std::result::Result<T, DevoError>;

/// Errors that can occur when talking to the Devo Alerts API
#[derive(Debug, Error)]
pub enum DevoError {
    /// Client configuration is invalid (endpoint override, header values)
    #[error("Invalid client configuration: {0}")]
    Configuration(String),

    /// An operation path could not be resolved against the base endpoint
    #[error("Malformed URL '{url}': {source}")]
    MalformedUrl {
        /// The URL or path that failed to parse
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A request failed client-side validation; nothing was sent
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Failed to build HTTP client
    #[error("Failed to build HTTP client: {0}")]
    BuildHttpClient(#[source] reqwest::Error),

    /// Failed to serialize the request body
    #[error("Failed to serialize request body: {0}")]
    Serialize(#[source] serde_json::Error),

    /// HTTP request failed before a response was fully received
    #[error("HTTP request failed: {0}")]
    Request(#[source] reqwest_middleware::Error),

    /// Response body was not valid JSON or did not match the expected shape
    #[error("Failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// Devo API returned a non-success status
    #[error("Devo API error: HTTP {status} - {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },
}

impl DevoError {
    /// Check if the error is retryable
    ///
    /// Returns `true` for:
    /// - Connection errors
    /// - Timeout errors
    /// - Server errors (5xx status codes)
    ///
    /// The client itself never retries; this is for callers that do.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(reqwest_middleware::Error::Reqwest(err)) => {
                err.is_connect() || err.is_timeout()
            }
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// HTTP status returned by the API, if this is an [`DevoError::Api`] error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for DevoError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(reqwest_middleware::Error::Reqwest(err))
    }
}
