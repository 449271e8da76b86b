//! # REST Resources
//!
//! A client-side library for talking to REST services through a pluggable
//! request pipeline, with typed entities on top.
//!
//! ## Overview
//!
//! This crate provides:
//! - A [`RestClient`] exposing `list`, `get`, `create`, `replace`, `patch`
//!   and `delete` over any resource
//! - A memoized [`Configurator`] whose server configuration reaches every
//!   request and the [`LinkGenerator`]
//! - Ordered [`RequestPreProcessor`]s that may answer a request themselves,
//!   and ordered [`ResponsePostProcessor`]s
//! - A response cache with TTL expiry and coalescing of identical in-flight
//!   requests, retries (`repeat_request`) and per-attempt timeouts
//! - Typed entities via [`EntityType`] and [`Entity`], with marshalling
//!   hooks, inline response bodies and patch merging
//! - A `reqwest`-backed transport ([`ReqwestAgent`]) and a base-URL link
//!   generator ([`BaseUrlLinkGenerator`])
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use rest_resources::{ClientConfig, RequestOptions};
//!
//! let config = ClientConfig::builder()
//!     .default_timeout(Duration::from_secs(10))
//!     .default_repeat_request(2)
//!     .default_header("Accept", "application/json")
//!     .build()
//!     .unwrap();
//!
//! let (options, headers) = config.resolve(&RequestOptions::new().cache(true));
//! assert_eq!(options.max_attempts(), 3);
//! assert!(options.cache);
//! assert_eq!(headers.get("accept"), Some("application/json"));
//! ```
//!
//! ## Making Requests
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rest_resources::{
//!     BaseUrlLinkGenerator, Parameters, RequestOptions, Resource, ReqwestAgent, RestClient,
//! };
//!
//! let client = RestClient::builder()
//!     .agent(Arc::new(ReqwestAgent::new()))
//!     .link_generator(Arc::new(BaseUrlLinkGenerator::new("https://api.example.com/v1")?))
//!     .build()?;
//!
//! // GET https://api.example.com/v1/articles?limit=10
//! let mut parameters = Parameters::new();
//! parameters.insert("limit".to_string(), 10.into());
//! let response = client
//!     .list(&Resource::new("articles"), parameters, RequestOptions::new().cache(true))
//!     .await?;
//!
//! println!("{} ({})", response.status(), response.status_name());
//! ```
//!
//! ## Typed Entities
//!
//! ```rust,ignore
//! use rest_resources::rest::{EntityResult, EntityType};
//!
//! #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
//! struct Article {
//!     id: Option<i64>,
//!     title: String,
//! }
//!
//! impl EntityType for Article {
//!     const RESOURCE_NAME: &'static str = "articles";
//!     const INLINE_RESPONSE_BODY: bool = true;
//! }
//!
//! let client = Arc::new(client);
//! if let EntityResult::Single(mut article) =
//!     Article::get(&client, 1, Parameters::new(), RequestOptions::new()).await?
//! {
//!     article.title = "New title".to_string();
//!     article.replace(RequestOptions::new()).await?;
//! }
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: every client owns its configuration, cache and
//!   configuration memo
//! - **Immutable values**: requests and responses are never mutated;
//!   processors derive new ones
//! - **Fail-fast wiring**: a client without a transport or link generator
//!   cannot be built
//! - **Thread-safe**: clients are `Send + Sync` and meant to be shared in an
//!   `Arc`
//! - **Async-first**: designed for use with the Tokio runtime

pub mod clients;
pub mod config;
pub mod error;
pub mod rest;

// Re-export public types at crate root for convenience
pub use config::{ClientConfig, ClientConfigBuilder, ConfiguratorFailurePolicy, DEFAULT_TTL};
pub use error::ConfigError;

// Re-export value objects and transport types
pub use clients::{
    AgentResponse, BoxFuture, Headers, HttpAgent, HttpMethod, Parameters, Request,
    RequestBuilder, RequestOptions, ResolvedOptions, ReqwestAgent, Response, ResponseBuilder,
    TransportError, TransportOptions,
};

// Re-export the pipeline and its collaborator traits
pub use clients::rest::{
    ConfigurationError, Configurator, LinkGenerator, PreProcessed, ProcessorError,
    RequestPreProcessor, ResponsePostProcessor, RestClient, RestClientBuilder, RestError,
    SubResourceClient,
};

// Re-export resource types
pub use rest::{
    BaseUrlLinkGenerator, Entity, EntityId, EntityMetadata, EntityResult, EntityType,
    ParentEntity, Resource,
};
