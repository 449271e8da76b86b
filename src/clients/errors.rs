//! Transport error types.
//!
//! [`TransportError`] describes why a single dispatch attempt failed. It is
//! `Clone` because one failure may be observed by every caller coalesced onto
//! the same in-flight request.
//!
//! # Example
//!
//! ```rust
//! use rest_resources::clients::TransportError;
//! use std::time::Duration;
//!
//! let error = TransportError::Timeout { timeout: Duration::from_millis(250) };
//! assert_eq!(error.to_string(), "Transport attempt timed out after 250ms");
//! ```

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Error returned when a transport attempt fails.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransportError {
    /// The request could not be delivered or its response could not be read.
    #[error("Network error: {message}")]
    Network {
        /// Description of the underlying failure.
        message: String,
    },

    /// The server answered with a non-2xx status code.
    #[error("Request failed with status {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The parsed response body.
        body: Value,
    },

    /// The attempt did not finish within the request timeout.
    #[error("Transport attempt timed out after {timeout:?}")]
    Timeout {
        /// The timeout that expired.
        timeout: Duration,
    },
}

impl TransportError {
    /// Returns the HTTP status code if the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Network { .. } | Self::Timeout { .. } => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network {
            message: error.to_string(),
        }
    }
}
