//! Request value object.
//!
//! This module provides the immutable [`Request`] snapshot that flows through
//! the pre-processor chain, and the [`RequestBuilder`] used to derive new
//! requests from existing ones.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::clients::{Headers, ResolvedOptions, TransportOptions};
use crate::rest::{ParentEntity, Resource};

/// Ordered mapping of request parameters.
///
/// Parameters are consumed by the link generator; they are never forwarded
/// to the transport as a query payload.
pub type Parameters = BTreeMap<String, Value>;

/// HTTP methods used by the REST client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// Retrieves a resource collection or entities.
    Get,
    /// Creates an entity.
    Post,
    /// Partially updates an entity.
    Patch,
    /// Replaces an entity.
    Put,
    /// Deletes entities.
    Delete,
}

impl HttpMethod {
    /// Returns the upper-case method name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable description of one REST API request.
///
/// Requests are never mutated. Pre-processors that need a different request
/// derive one with [`Request::to_builder`] or one of the `with_*` shortcuts;
/// every field they do not touch is carried forward.
///
/// # Example
///
/// ```rust
/// use rest_resources::{HttpMethod, Request, Resource};
///
/// let request = Request::builder(HttpMethod::Get, "https://x/baz/xyz", Resource::new("foo"))
///     .build();
///
/// let rewritten = request.with_url("https://x/baz?id=yup");
///
/// assert_eq!(request.url(), "https://x/baz/xyz");
/// assert_eq!(rewritten.url(), "https://x/baz?id=yup");
/// assert_eq!(rewritten.resource(), request.resource());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    method: HttpMethod,
    url: String,
    resource: Resource,
    parent_entity: Option<ParentEntity>,
    parameters: Parameters,
    data: Option<Value>,
    headers: Headers,
    options: ResolvedOptions,
    server_configuration: Option<Arc<Value>>,
}

impl Request {
    /// Creates a builder for a request with the given method, URL and resource.
    #[must_use]
    pub fn builder(
        method: HttpMethod,
        url: impl Into<String>,
        resource: Resource,
    ) -> RequestBuilder {
        RequestBuilder::new(method, url.into(), resource)
    }

    /// Returns a builder pre-filled with this request's fields.
    #[must_use]
    pub fn to_builder(&self) -> RequestBuilder {
        RequestBuilder {
            request: self.clone(),
        }
    }

    /// Returns a copy of this request targeting another URL.
    #[must_use]
    pub fn with_url(&self, url: impl Into<String>) -> Self {
        self.to_builder().url(url).build()
    }

    /// Returns a copy of this request with one header added or replaced.
    #[must_use]
    pub fn with_header(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.to_builder().header(name, value).build()
    }

    /// Returns a copy of this request carrying another payload.
    #[must_use]
    pub fn with_data(&self, data: Option<Value>) -> Self {
        self.to_builder().data(data).build()
    }

    /// The HTTP method.
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// The target URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The resource being accessed.
    #[must_use]
    pub const fn resource(&self) -> &Resource {
        &self.resource
    }

    /// The entity owning the accessed sub-resource, if any.
    #[must_use]
    pub const fn parent_entity(&self) -> Option<&ParentEntity> {
        self.parent_entity.as_ref()
    }

    /// The parameters the URL was generated from.
    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// The request payload.
    #[must_use]
    pub const fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// The request headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The resolved request options.
    #[must_use]
    pub const fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    /// The server-provided configuration, if a configurator supplied one.
    #[must_use]
    pub fn server_configuration(&self) -> Option<&Value> {
        self.server_configuration.as_deref()
    }

    /// The options handed to the transport for this request.
    #[must_use]
    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            headers: self.headers.clone(),
            with_credentials: self.options.with_credentials,
            timeout: self.options.timeout,
        }
    }
}

/// Builder for [`Request`] values.
///
/// Unset fields default to: no parent entity, no parameters, no payload,
/// no headers, a 60 second TTL with caching disabled and no retries, and no
/// server configuration.
#[derive(Clone, Debug)]
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    fn new(method: HttpMethod, url: String, resource: Resource) -> Self {
        Self {
            request: Request {
                method,
                url,
                resource,
                parent_entity: None,
                parameters: Parameters::new(),
                data: None,
                headers: Headers::new(),
                options: ResolvedOptions {
                    timeout: None,
                    ttl: crate::config::DEFAULT_TTL,
                    repeat_request: 0,
                    cache: false,
                    with_credentials: None,
                },
                server_configuration: None,
            },
        }
    }

    /// Sets the HTTP method.
    #[must_use]
    pub const fn method(mut self, method: HttpMethod) -> Self {
        self.request.method = method;
        self
    }

    /// Sets the target URL.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.request.url = url.into();
        self
    }

    /// Sets the resource.
    #[must_use]
    pub fn resource(mut self, resource: Resource) -> Self {
        self.request.resource = resource;
        self
    }

    /// Sets the parent entity.
    #[must_use]
    pub fn parent_entity(mut self, parent_entity: Option<ParentEntity>) -> Self {
        self.request.parent_entity = parent_entity;
        self
    }

    /// Sets all parameters.
    #[must_use]
    pub fn parameters(mut self, parameters: Parameters) -> Self {
        self.request.parameters = parameters;
        self
    }

    /// Sets the payload.
    #[must_use]
    pub fn data(mut self, data: Option<Value>) -> Self {
        self.request.data = data;
        self
    }

    /// Replaces all headers.
    #[must_use]
    pub fn headers(mut self, headers: Headers) -> Self {
        self.request.headers = headers;
        self
    }

    /// Adds or replaces a single header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.headers.insert(name, value);
        self
    }

    /// Sets the resolved options.
    #[must_use]
    pub fn options(mut self, options: ResolvedOptions) -> Self {
        self.request.options = options;
        self
    }

    /// Sets the server configuration.
    #[must_use]
    pub fn server_configuration(mut self, server_configuration: Option<Arc<Value>>) -> Self {
        self.request.server_configuration = server_configuration;
        self
    }

    /// Builds the request.
    #[must_use]
    pub fn build(self) -> Request {
        self.request
    }
}
