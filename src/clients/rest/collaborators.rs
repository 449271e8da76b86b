//! Collaborator interfaces supplied by the host application.
//!
//! - [`Configurator`]: resolves server-provided configuration once per client
//! - [`LinkGenerator`]: builds the URL of every request
//! - [`RequestPreProcessor`]: transforms a request, or answers it directly
//! - [`ResponsePostProcessor`]: transforms a response
//!
//! Pre- and post-processors are registered as ordered lists and run strictly
//! in registration order.

use std::error::Error as StdError;

use serde_json::Value;
use thiserror::Error;

use crate::clients::{BoxFuture, Parameters, Request, Response};
use crate::rest::{EntityId, ParentEntity, Resource};

/// Error returned by a configurator that could not resolve the configuration.
///
/// The error is `Clone` so a client using
/// [`ConfiguratorFailurePolicy::Poison`](crate::ConfiguratorFailurePolicy::Poison)
/// can hand the memoized failure to every later operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Failed to resolve server configuration: {message}")]
pub struct ConfigurationError {
    /// Description of the failure.
    pub message: String,
}

impl ConfigurationError {
    /// Creates a configuration error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error returned by a request pre-processor or response post-processor.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProcessorError {
    /// Description of the failure.
    pub message: String,
    /// The underlying cause, if any.
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl ProcessorError {
    /// Creates a processor error without an underlying cause.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a processor error wrapping an underlying cause.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Resolves the configuration provided by the server.
///
/// The client calls [`get_configuration`](Configurator::get_configuration) at
/// most once during its lifetime; operations issued while the first call is
/// pending wait for the same result. `Ok(None)` means the server provides no
/// configuration.
pub trait Configurator: Send + Sync {
    /// Fetches the server configuration.
    fn get_configuration(&self) -> BoxFuture<'_, Result<Option<Value>, ConfigurationError>>;
}

/// Generates the URL used to access a resource.
///
/// Implementations must be pure: no I/O and no side effects. Parameters used
/// here are considered consumed; the client never forwards them to the
/// transport.
pub trait LinkGenerator: Send + Sync {
    /// Builds the URL.
    ///
    /// `id` is `None` for collection-level operations (list and create).
    /// `server_configuration` is `None` when no configurator is set or the
    /// configurator provided nothing.
    fn create_link(
        &self,
        parent_entity: Option<&ParentEntity>,
        resource: &Resource,
        id: Option<&EntityId>,
        parameters: &Parameters,
        server_configuration: Option<&Value>,
    ) -> String;
}

/// Result of a request pre-processor.
#[derive(Clone, Debug, PartialEq)]
pub enum PreProcessed {
    /// Continue with this request.
    Request(Request),
    /// Stop pre-processing and skip the transport; this response goes
    /// straight to the post-processors.
    Response(Response),
}

/// Transforms requests before they are dispatched.
pub trait RequestPreProcessor: Send + Sync {
    /// Processes the request produced by the previous stage.
    fn process(&self, request: Request) -> BoxFuture<'_, Result<PreProcessed, ProcessorError>>;
}

/// Transforms responses before they are returned.
pub trait ResponsePostProcessor: Send + Sync {
    /// Processes the response produced by the previous stage.
    fn process(&self, response: Response) -> BoxFuture<'_, Result<Response, ProcessorError>>;
}
