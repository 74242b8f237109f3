//! Error types for the CIS toolkit
//!
//! This module defines all error types used throughout the crate.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for CIS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the CIS toolkit
#[derive(Error, Debug)]
pub enum Error {
    /// Failure to acquire a client session
    #[error("Session error: {0}")]
    Session(String),

    /// Remote API call failed with an HTTP status
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code reported by the collaborator
        status: u16,
        /// Message, prefixed with call-site context
        message: String,
    },

    /// Remote object not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// A handle did not split into the expected number of components
    #[error("Malformed handle '{handle}': expected {expected} components, found {found}")]
    MalformedHandle {
        /// The offending handle
        handle: String,
        /// Arity the call site expects
        expected: usize,
        /// Number of components actually present
        found: usize,
    },

    /// Polling gave up before the remote object reached a target status
    #[error("Timed out after {elapsed:?} waiting for state {target:?} (last status: {last_status:?})")]
    Timeout {
        /// Target statuses being waited for
        target: Vec<String>,
        /// Last status observed, if any fetch completed
        last_status: Option<String>,
        /// Wall-clock time spent polling
        elapsed: Duration,
    },

    /// Polling observed the configured failure status
    #[error("Remote object reached failure state '{status}': {observed}")]
    FailedState {
        /// The failure status value
        status: String,
        /// Debug rendering of the last observed object
        observed: String,
    },

    /// A change would alter a handle component and needs a replace
    #[error("Change to '{0}' requires replacing the resource")]
    RequiresReplace(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport-level HTTP errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a session acquisition error
    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session(msg.into())
    }

    /// Create an API error
    pub fn api(status: u16, msg: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: msg.into(),
        }
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an HTTP transport error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Whether this error means the remote object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Api { status: 404, .. })
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            Self::RateLimited(_) => Some(429),
            _ => None,
        }
    }

    /// Prefix the message with call-site context, keeping the variant
    ///
    /// A `NotFound` stays a `NotFound`, so delete polls and `exists`
    /// checks still recognise it after wrapping.
    pub fn with_context(self, context: impl AsRef<str>) -> Self {
        let context = context.as_ref();
        match self {
            Self::Api { status, message } => Self::Api {
                status,
                message: format!("{context}: {message}"),
            },
            Self::NotFound(msg) => Self::NotFound(format!("{context}: {msg}")),
            Self::Authentication(msg) => Self::Authentication(format!("{context}: {msg}")),
            Self::RateLimited(msg) => Self::RateLimited(format!("{context}: {msg}")),
            Self::Http(msg) => Self::Http(format!("{context}: {msg}")),
            Self::Other(msg) => Self::Other(format!("{context}: {msg}")),
            other => other,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
