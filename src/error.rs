use thiserror::Error;

/// SoftOne client error types
#[derive(Error, Debug)]
pub enum SoftoneError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parsing failed: {0}")]
    Url(#[from] url::ParseError),

    /// Missing or invalid client configuration. Raised before any request
    /// is issued; never retried.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The gateway explicitly reported a failed login/authenticate chain.
    #[error("Session establishment failed: {0}")]
    Session(String),

    /// The response declared a content type other than the single value the
    /// gateway is contracted to use.
    #[error("ContentType {found} different from {expected}")]
    Protocol { found: String, expected: String },
}

/// Result type for SoftOne operations
pub type SoftoneResult<T> = Result<T, SoftoneError>;

impl SoftoneError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a session error
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session(message.into())
    }
}
