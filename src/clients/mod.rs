//! Value objects and transport layer.
//!
//! # Overview
//!
//! - [`Request`] / [`RequestBuilder`]: the immutable request snapshot
//! - [`Response`] / [`ResponseBuilder`]: the immutable response snapshot
//! - [`HttpAgent`]: the transport collaborator, one function per HTTP method
//! - [`ReqwestAgent`]: the bundled `reqwest` transport
//! - [`RequestOptions`], [`ResolvedOptions`], [`TransportOptions`]: option surfaces
//! - [`Headers`]: case-insensitive header map
//! - [`TransportError`]: why a transport attempt failed
//! - [`rest`]: the orchestration pipeline built on top of these types

mod errors;
mod headers;
mod http_agent;
mod http_request;
mod http_response;
mod options;
pub mod rest;

pub use errors::TransportError;
pub use headers::Headers;
pub use http_agent::{BoxFuture, HttpAgent, ReqwestAgent};
pub use http_request::{HttpMethod, Parameters, Request, RequestBuilder};
pub use http_response::{AgentResponse, Response, ResponseBuilder};
pub use options::{RequestOptions, ResolvedOptions, TransportOptions};

// Re-export REST client types at the clients module level
pub use rest::{RestClient, RestError};
