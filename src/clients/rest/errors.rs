//! Pipeline error types.
//!
//! Every REST operation fails with a [`RestError`]. The variant tells which
//! stage of the pipeline failed:
//!
//! - [`RestError::Configuration`]: the configurator failed (never retried)
//! - [`RestError::PreProcessor`] / [`RestError::PostProcessor`]: a processor
//!   failed; remaining stages were skipped (never retried)
//! - [`RestError::Transport`]: the only transport attempt failed
//! - [`RestError::MaxRetriesExceeded`]: every allowed attempt failed
//! - [`RestError::MissingEntityId`]: an entity operation needed an id the
//!   entity does not have
//! - [`RestError::Serialization`]: entity state could not be converted
//!
//! # Example
//!
//! ```rust,ignore
//! use rest_resources::{RestError, Resource, EntityId, Parameters, RequestOptions};
//!
//! match client.get(&Resource::new("articles"), EntityId::from(1), Parameters::new(), RequestOptions::new()).await {
//!     Ok(response) => println!("Article: {}", response.body()),
//!     Err(RestError::MaxRetriesExceeded { tries, source }) => {
//!         println!("Gave up after {tries} attempts: {source}");
//!     }
//!     Err(e) => println!("Request failed: {e}"),
//! }
//! ```

use thiserror::Error;

use crate::clients::rest::{ConfigurationError, ProcessorError};
use crate::clients::TransportError;
use crate::rest::Resource;

/// Error type for REST operations.
#[derive(Debug, Error)]
pub enum RestError {
    /// The configurator failed to resolve the server configuration.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A request pre-processor failed.
    #[error("Request pre-processor #{index} failed: {source}")]
    PreProcessor {
        /// Position of the failing processor in registration order.
        index: usize,
        /// The processor's error.
        #[source]
        source: ProcessorError,
    },

    /// A response post-processor failed.
    #[error("Response post-processor #{index} failed: {source}")]
    PostProcessor {
        /// Position of the failing processor in registration order.
        index: usize,
        /// The processor's error.
        #[source]
        source: ProcessorError,
    },

    /// A single transport attempt failed and no retry was allowed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Every allowed transport attempt failed.
    #[error("Exceeded maximum number of retries ({tries} attempts): {source}")]
    MaxRetriesExceeded {
        /// Number of attempts made.
        tries: u32,
        /// The error of the last attempt.
        #[source]
        source: TransportError,
    },

    /// The entity has no value in its id field.
    #[error("Entity of resource '{resource}' has no value in its '{field}' field")]
    MissingEntityId {
        /// The entity's resource.
        resource: Resource,
        /// The id field that was empty.
        field: &'static str,
    },

    /// Entity state could not be converted to or from JSON.
    #[error("Entity serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Final outcome of a failed dispatch: the last error and how many attempts
/// were made.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DispatchFailure {
    pub(crate) tries: u32,
    pub(crate) error: TransportError,
}

impl From<DispatchFailure> for RestError {
    fn from(failure: DispatchFailure) -> Self {
        if failure.tries > 1 {
            Self::MaxRetriesExceeded {
                tries: failure.tries,
                source: failure.error,
            }
        } else {
            Self::Transport(failure.error)
        }
    }
}

impl RestError {
    /// Returns the transport error behind this error, if any.
    #[must_use]
    pub const fn transport_error(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(source) | Self::MaxRetriesExceeded { source, .. } => Some(source),
            _ => None,
        }
    }
}
