//! REST orchestration pipeline.
//!
//! This module composes the transport and the host-supplied collaborators
//! into CRUD operations.
//!
//! # Overview
//!
//! - [`RestClient`]: `list()`, `get()`, `create()`, `replace()`, `patch()`, `delete()`
//! - [`SubResourceClient`]: the same operations within a parent entity
//! - [`Configurator`], [`LinkGenerator`], [`RequestPreProcessor`],
//!   [`ResponsePostProcessor`]: collaborator interfaces
//! - [`RestError`]: error type for REST operations
//!
//! # Caching
//!
//! With `cache` enabled, identical requests (same method, URL, parameters,
//! headers and payload) share one response for its `ttl`. Requests issued while an
//! identical one is in flight wait for it instead of dispatching again.
//! Responses served either way are marked [`cached`](crate::Response::cached).
//!
//! # Retry Behavior
//!
//! A network error, a non-2xx status or an expired `timeout` fails the
//! attempt. The same request is dispatched again up to `repeat_request`
//! times; pre-processors are not re-run. After more than one attempt the
//! failure surfaces as [`RestError::MaxRetriesExceeded`].

mod cache;
mod client;
mod collaborators;
mod errors;
mod memo;

pub(crate) use client::Operation;
pub use client::{RestClient, RestClientBuilder, SubResourceClient};
pub use collaborators::{
    ConfigurationError, Configurator, LinkGenerator, PreProcessed, ProcessorError,
    RequestPreProcessor, ResponsePostProcessor,
};
pub use errors::RestError;
