//! Construction and configuration errors.
//!
//! These errors are raised synchronously while building a [`ClientConfig`]
//! or a [`RestClient`], never as the failure of an in-flight operation.
//!
//! # Example
//!
//! ```rust
//! use rest_resources::{ConfigError, RestClient};
//!
//! let result = RestClient::builder().build();
//! assert!(matches!(
//!     result,
//!     Err(ConfigError::MissingRequiredField { field: "agent" })
//! ));
//! ```
//!
//! [`ClientConfig`]: crate::ClientConfig
//! [`RestClient`]: crate::RestClient

use thiserror::Error;

/// Errors that can occur while configuring or wiring a client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required collaborator or field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the client.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// A default header has an empty or whitespace-only name.
    #[error("Invalid header name '{name}'. Header names cannot be empty.")]
    InvalidHeaderName {
        /// The invalid header name that was provided.
        name: String,
    },

    /// The base URL of a link generator is unusable.
    #[error("Invalid base URL '{url}'. Please provide a URL with scheme (e.g., 'https://api.example.com').")]
    InvalidBaseUrl {
        /// The invalid URL that was provided.
        url: String,
    },
}
