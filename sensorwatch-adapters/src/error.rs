//! Error types for reading sources.

use thiserror::Error;

/// Errors that can occur when fetching a module snapshot.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// HTTP request failed or returned a non-success status.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The response could not be interpreted as a snapshot.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// The source does not know the requested host or module.
    #[error("Unknown module '{module}' on host '{host}'")]
    UnknownModule { host: String, module: String },
}

impl AdapterError {
    /// Returns true for failures caused by the network rather than the payload.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AdapterError::Http(_) | AdapterError::Connection(_) | AdapterError::Timeout
        )
    }
}

#[cfg(feature = "netbotz")]
impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout
        } else if err.is_connect() {
            AdapterError::Connection(err.to_string())
        } else {
            AdapterError::Http(err.to_string())
        }
    }
}
