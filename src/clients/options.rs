//! Request option types.
//!
//! - [`RequestOptions`]: what a caller passes to an operation
//! - [`ResolvedOptions`]: the options recorded on a [`Request`] after the
//!   client's defaults have been applied
//! - [`TransportOptions`]: the subset forwarded to the transport
//!
//! `ttl`, `repeat_request` and `cache` drive the pipeline itself and never
//! reach the transport.
//!
//! [`Request`]: crate::clients::Request

use std::time::Duration;

use crate::clients::Headers;

/// Per-operation options supplied by the caller.
///
/// Every field is optional; unset fields fall back to the defaults in
/// [`ClientConfig`](crate::ClientConfig).
///
/// # Example
///
/// ```rust
/// use rest_resources::RequestOptions;
/// use std::time::Duration;
///
/// let options = RequestOptions::new()
///     .timeout(Duration::from_secs(5))
///     .repeat_request(2)
///     .cache(true)
///     .header("X-Custom", "value");
///
/// assert_eq!(options.repeat_request, Some(2));
/// assert_eq!(options.headers.get("x-custom"), Some("value"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Upper bound for a single transport attempt.
    pub timeout: Option<Duration>,
    /// Lifetime of the cache entry written for this request.
    pub ttl: Option<Duration>,
    /// Number of additional attempts after a transport failure.
    pub repeat_request: Option<u32>,
    /// Headers merged over the client's default headers.
    pub headers: Headers,
    /// Whether the operation reads from and writes to the response cache.
    pub cache: Option<bool>,
    /// Forwarded verbatim to the transport.
    pub with_credentials: Option<bool>,
}

impl RequestOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the transport attempt timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the cache entry lifetime.
    #[must_use]
    pub const fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Sets the number of retries after a transport failure.
    #[must_use]
    pub const fn repeat_request(mut self, repeat_request: u32) -> Self {
        self.repeat_request = Some(repeat_request);
        self
    }

    /// Opts the operation in or out of the response cache.
    #[must_use]
    pub const fn cache(mut self, cache: bool) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets the credentials flag forwarded to the transport.
    #[must_use]
    pub const fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = Some(with_credentials);
        self
    }

    /// Adds a single request header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replaces all request headers.
    #[must_use]
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }
}

/// Options recorded on a request once defaults have been applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedOptions {
    /// Upper bound for a single transport attempt; `None` means unbounded.
    pub timeout: Option<Duration>,
    /// Lifetime of a cache entry written for the request.
    pub ttl: Duration,
    /// Number of additional attempts after a transport failure.
    pub repeat_request: u32,
    /// Whether the request reads from and writes to the response cache.
    pub cache: bool,
    /// Credentials flag forwarded to the transport, if set.
    pub with_credentials: Option<bool>,
}

impl ResolvedOptions {
    /// Total number of transport attempts allowed for the request.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.repeat_request.saturating_add(1)
    }
}

/// The options the transport receives with each dispatch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransportOptions {
    /// Request headers.
    pub headers: Headers,
    /// Credentials flag for credentialed cross-origin requests.
    pub with_credentials: Option<bool>,
    /// Upper bound for the attempt.
    pub timeout: Option<Duration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_options_default_is_empty() {
        let options = RequestOptions::new();
        assert!(options.timeout.is_none());
        assert!(options.ttl.is_none());
        assert!(options.repeat_request.is_none());
        assert!(options.cache.is_none());
        assert!(options.with_credentials.is_none());
        assert!(options.headers.is_empty());
    }

    #[test]
    fn test_request_options_chaining() {
        let options = RequestOptions::new()
            .ttl(Duration::from_secs(30))
            .cache(true)
            .with_credentials(true)
            .header("Custom-Header", "stuff");

        assert_eq!(options.ttl, Some(Duration::from_secs(30)));
        assert_eq!(options.cache, Some(true));
        assert_eq!(options.with_credentials, Some(true));
        assert_eq!(options.headers.get("custom-header"), Some("stuff"));
    }

    #[test]
    fn test_max_attempts_counts_first_try() {
        let resolved = ResolvedOptions {
            timeout: None,
            ttl: Duration::from_secs(1),
            repeat_request: 0,
            cache: false,
            with_credentials: None,
        };
        assert_eq!(resolved.max_attempts(), 1);

        let resolved = ResolvedOptions {
            repeat_request: 3,
            ..resolved
        };
        assert_eq!(resolved.max_attempts(), 4);
    }
}
