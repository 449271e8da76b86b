//! Response value objects.
//!
//! - [`AgentResponse`]: the raw result returned by the transport
//! - [`Response`]: the immutable response handed to post-processors and callers

use std::sync::Arc;

use serde_json::Value;

use crate::clients::{Headers, Request};

/// The raw result of a transport dispatch.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentResponse {
    /// The HTTP status code.
    pub status: u16,
    /// The parsed response body.
    pub body: Value,
    /// The response headers.
    pub headers: Headers,
}

impl AgentResponse {
    /// Creates a new agent response.
    #[must_use]
    pub const fn new(status: u16, body: Value, headers: Headers) -> Self {
        Self {
            status,
            body,
            headers,
        }
    }

    /// Returns `true` if the status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status >= 200 && self.status <= 299
    }
}

/// An immutable REST API response.
///
/// Header names are lower-cased on construction. The body is owned by the
/// response; later changes to the caller's data can never leak into it.
/// Post-processors derive new responses with [`Response::to_builder`] or the
/// `with_*` shortcuts.
///
/// # Example
///
/// ```rust
/// use rest_resources::{Headers, HttpMethod, Request, Resource, Response};
/// use serde_json::json;
///
/// let request = Request::builder(HttpMethod::Get, "https://x/foo", Resource::new("foo")).build();
/// let headers: Headers = [("Other-Header", "other stuff")].into_iter().collect();
/// let response = Response::new(206, headers, json!({"stuff": 3}), request);
///
/// assert_eq!(response.status_name(), "Partial Content");
/// assert_eq!(response.headers().iter().next(), Some(("other-header", "other stuff")));
///
/// let adjusted = response.with_status(200);
/// assert_eq!(adjusted.status(), 200);
/// assert_eq!(response.status(), 206);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    status: u16,
    status_name: String,
    headers: Headers,
    body: Arc<Value>,
    cached: bool,
    request: Request,
}

impl Response {
    /// Creates a response that did not come from the cache.
    ///
    /// The status name defaults to the canonical reason phrase of `status`.
    #[must_use]
    pub fn new(status: u16, headers: Headers, body: Value, request: Request) -> Self {
        Self {
            status,
            status_name: canonical_status_name(status),
            headers: headers.lowercased(),
            body: Arc::new(body),
            cached: false,
            request,
        }
    }

    /// Creates a response from a transport result.
    #[must_use]
    pub fn from_agent(agent_response: AgentResponse, request: Request) -> Self {
        Self::new(
            agent_response.status,
            agent_response.headers,
            agent_response.body,
            request,
        )
    }

    /// Returns a builder pre-filled with this response's fields.
    #[must_use]
    pub fn to_builder(&self) -> ResponseBuilder {
        ResponseBuilder {
            response: self.clone(),
        }
    }

    /// Returns a copy with another status code and its canonical status name.
    #[must_use]
    pub fn with_status(&self, status: u16) -> Self {
        self.to_builder()
            .status(status)
            .status_name(canonical_status_name(status))
            .build()
    }

    /// Returns a copy with another body.
    #[must_use]
    pub fn with_body(&self, body: Value) -> Self {
        self.to_builder().body(body).build()
    }

    /// Returns a copy with the cache flag set.
    #[must_use]
    pub fn with_cached(&self, cached: bool) -> Self {
        self.to_builder().cached(cached).build()
    }

    /// Returns a copy bound to another request.
    #[must_use]
    pub fn with_request(&self, request: Request) -> Self {
        self.to_builder().request(request).build()
    }

    /// The HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// The human-readable status name.
    #[must_use]
    pub fn status_name(&self) -> &str {
        &self.status_name
    }

    /// The response headers, keyed by lower-case name.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The parsed response body.
    #[must_use]
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// `true` if the response was served from the cache without a transport
    /// round trip.
    #[must_use]
    pub const fn cached(&self) -> bool {
        self.cached
    }

    /// The request that produced this response.
    #[must_use]
    pub const fn request(&self) -> &Request {
        &self.request
    }

    /// Returns `true` if the status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status >= 200 && self.status <= 299
    }

    /// Returns the `X-Request-Id` header value, if present.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.headers.get("x-request-id")
    }
}

/// Builder for [`Response`] values derived from an existing response.
#[derive(Clone, Debug)]
pub struct ResponseBuilder {
    response: Response,
}

impl ResponseBuilder {
    /// Sets the status code, keeping the current status name.
    #[must_use]
    pub const fn status(mut self, status: u16) -> Self {
        self.response.status = status;
        self
    }

    /// Sets the status name.
    #[must_use]
    pub fn status_name(mut self, status_name: impl Into<String>) -> Self {
        self.response.status_name = status_name.into();
        self
    }

    /// Replaces the headers; names are lower-cased.
    #[must_use]
    pub fn headers(mut self, headers: &Headers) -> Self {
        self.response.headers = headers.lowercased();
        self
    }

    /// Replaces the body.
    #[must_use]
    pub fn body(mut self, body: Value) -> Self {
        self.response.body = Arc::new(body);
        self
    }

    /// Sets the cache flag.
    #[must_use]
    pub const fn cached(mut self, cached: bool) -> Self {
        self.response.cached = cached;
        self
    }

    /// Sets the originating request.
    #[must_use]
    pub fn request(mut self, request: Request) -> Self {
        self.response.request = request;
        self
    }

    /// Builds the response.
    #[must_use]
    pub fn build(self) -> Response {
        self.response
    }
}

fn canonical_status_name(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or_default()
        .to_string()
}
