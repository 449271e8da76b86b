//! Transport collaborator.
//!
//! The REST client never speaks HTTP itself. It dispatches every request
//! through an [`HttpAgent`], which exposes one function per HTTP method.
//! [`ReqwestAgent`] is the bundled `reqwest` implementation.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::clients::{AgentResponse, Headers, HttpMethod, TransportError, TransportOptions};

/// A boxed, `Send` future borrowed for `'a`.
///
/// Collaborator traits return this type so they stay object safe and can be
/// stored as `Arc<dyn Trait>` or `Box<dyn Trait>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Performs HTTP requests on behalf of the REST client.
///
/// Implementors only have to provide [`send`](HttpAgent::send); the
/// per-method functions delegate to it. An agent may answer a non-2xx
/// status either with `Err(TransportError::Status)` or with an
/// [`AgentResponse`] carrying that status; the client treats both as a
/// failed attempt.
///
/// # Example
///
/// ```rust
/// use rest_resources::clients::{
///     AgentResponse, BoxFuture, Headers, HttpAgent, HttpMethod, TransportError,
///     TransportOptions,
/// };
/// use serde_json::{json, Value};
///
/// struct EchoAgent;
///
/// impl HttpAgent for EchoAgent {
///     fn send<'a>(
///         &'a self,
///         _method: HttpMethod,
///         url: &'a str,
///         _data: Option<&'a Value>,
///         _options: &'a TransportOptions,
///     ) -> BoxFuture<'a, Result<AgentResponse, TransportError>> {
///         Box::pin(async move { Ok(AgentResponse::new(200, json!({ "url": url }), Headers::new())) })
///     }
/// }
/// ```
pub trait HttpAgent: Send + Sync {
    /// Dispatches a request with the given method.
    fn send<'a>(
        &'a self,
        method: HttpMethod,
        url: &'a str,
        data: Option<&'a Value>,
        options: &'a TransportOptions,
    ) -> BoxFuture<'a, Result<AgentResponse, TransportError>>;

    /// Dispatches a GET request.
    fn get<'a>(
        &'a self,
        url: &'a str,
        data: Option<&'a Value>,
        options: &'a TransportOptions,
    ) -> BoxFuture<'a, Result<AgentResponse, TransportError>> {
        self.send(HttpMethod::Get, url, data, options)
    }

    /// Dispatches a POST request.
    fn post<'a>(
        &'a self,
        url: &'a str,
        data: Option<&'a Value>,
        options: &'a TransportOptions,
    ) -> BoxFuture<'a, Result<AgentResponse, TransportError>> {
        self.send(HttpMethod::Post, url, data, options)
    }

    /// Dispatches a PATCH request.
    fn patch<'a>(
        &'a self,
        url: &'a str,
        data: Option<&'a Value>,
        options: &'a TransportOptions,
    ) -> BoxFuture<'a, Result<AgentResponse, TransportError>> {
        self.send(HttpMethod::Patch, url, data, options)
    }

    /// Dispatches a PUT request.
    fn put<'a>(
        &'a self,
        url: &'a str,
        data: Option<&'a Value>,
        options: &'a TransportOptions,
    ) -> BoxFuture<'a, Result<AgentResponse, TransportError>> {
        self.send(HttpMethod::Put, url, data, options)
    }

    /// Dispatches a DELETE request.
    fn delete<'a>(
        &'a self,
        url: &'a str,
        data: Option<&'a Value>,
        options: &'a TransportOptions,
    ) -> BoxFuture<'a, Result<AgentResponse, TransportError>> {
        self.send(HttpMethod::Delete, url, data, options)
    }
}

/// [`HttpAgent`] backed by a `reqwest` client.
///
/// - Payloads are sent as JSON bodies; a GET payload object becomes the
///   query string
/// - Response header names are lower-cased
/// - Non-2xx responses become [`TransportError::Status`]
/// - `with_credentials` has no meaning outside a browser and is ignored
///
/// # Thread Safety
///
/// `ReqwestAgent` is `Send + Sync` and cheap to clone.
#[derive(Clone, Debug, Default)]
pub struct ReqwestAgent {
    client: reqwest::Client,
}

// Verify ReqwestAgent is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ReqwestAgent>();
};

impl ReqwestAgent {
    /// Creates an agent with a default `reqwest` client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an agent around an existing `reqwest` client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn dispatch(
        &self,
        method: HttpMethod,
        url: &str,
        data: Option<&Value>,
        options: &TransportOptions,
    ) -> Result<AgentResponse, TransportError> {
        let mut req_builder = match method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
            HttpMethod::Patch => self.client.patch(url),
            HttpMethod::Put => self.client.put(url),
            HttpMethod::Delete => self.client.delete(url),
        };

        req_builder = req_builder.header("Accept", "application/json");
        for (name, value) in options.headers.iter() {
            req_builder = req_builder.header(name, value);
        }

        if let Some(timeout) = options.timeout {
            req_builder = req_builder.timeout(timeout);
        }

        if options.with_credentials.is_some() {
            tracing::trace!(url, "with_credentials is ignored outside a browser");
        }

        match (method, data) {
            (_, None | Some(Value::Null)) => {}
            (HttpMethod::Get, Some(Value::Object(query))) => {
                let pairs: Vec<(&str, String)> = query
                    .iter()
                    .map(|(key, value)| (key.as_str(), query_value(value)))
                    .collect();
                req_builder = req_builder.query(&pairs);
            }
            (_, Some(body)) => {
                req_builder = req_builder.json(body);
            }
        }

        let res = req_builder.send().await.map_err(|error| {
            match (error.is_timeout(), options.timeout) {
                (true, Some(timeout)) => TransportError::Timeout { timeout },
                _ => TransportError::from(error),
            }
        })?;

        let status = res.status().as_u16();
        let headers = Self::parse_response_headers(res.headers());
        let body_text = res.text().await?;

        let body = if body_text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body_text).unwrap_or(Value::String(body_text))
        };

        let response = AgentResponse::new(status, body, headers);
        if !response.is_ok() {
            return Err(TransportError::Status {
                status,
                body: response.body,
            });
        }

        Ok(response)
    }

    /// Lower-cases header names; repeated headers are joined with `", "`.
    fn parse_response_headers(headers: &reqwest::header::HeaderMap) -> Headers {
        let mut result = Headers::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default();
            let joined = match result.get(&key) {
                Some(existing) => format!("{existing}, {value}"),
                None => value.to_string(),
            };
            result.insert(key, joined);
        }
        result
    }
}

impl HttpAgent for ReqwestAgent {
    fn send<'a>(
        &'a self,
        method: HttpMethod,
        url: &'a str,
        data: Option<&'a Value>,
        options: &'a TransportOptions,
    ) -> BoxFuture<'a, Result<AgentResponse, TransportError>> {
        Box::pin(self.dispatch(method, url, data, options))
    }
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
