//! Client configuration.
//!
//! This module provides the defaults a [`RestClient`](crate::RestClient)
//! applies to every operation, and the policy it follows when the
//! configurator fails.
//!
//! # Overview
//!
//! - [`ClientConfig`]: default request options, retry delay and configurator policy
//! - [`ClientConfigBuilder`]: a builder for constructing [`ClientConfig`] instances
//! - [`ConfiguratorFailurePolicy`]: what happens after the configurator fails
//!
//! # Example
//!
//! ```rust
//! use rest_resources::{ClientConfig, ConfiguratorFailurePolicy};
//! use std::time::Duration;
//!
//! let config = ClientConfig::builder()
//!     .default_timeout(Duration::from_secs(10))
//!     .default_repeat_request(2)
//!     .default_header("Accept-Language", "en")
//!     .failure_policy(ConfiguratorFailurePolicy::Poison)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.default_repeat_request(), 2);
//! ```

use std::time::Duration;

use crate::clients::{Headers, RequestOptions, ResolvedOptions};
use crate::error::ConfigError;

/// Cache entry lifetime used when neither the caller nor the client
/// configuration sets one.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// What the client does after its configurator failed.
///
/// The configurator is called at most once per client lifetime as long as it
/// succeeds. This policy decides whether a failure counts as that one call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConfiguratorFailurePolicy {
    /// Leave the configuration unresolved; the next operation calls the
    /// configurator again.
    #[default]
    Retry,
    /// Remember the failure; every later operation fails with the same
    /// error without calling the configurator.
    Poison,
}

/// Defaults applied by a [`RestClient`](crate::RestClient).
///
/// Per-operation [`RequestOptions`] override these values field by field;
/// headers are merged, with the caller's headers winning.
///
/// # Thread Safety
///
/// `ClientConfig` is `Clone`, `Send`, and `Sync`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    default_timeout: Option<Duration>,
    default_ttl: Duration,
    default_repeat_request: u32,
    default_cache: bool,
    default_with_credentials: Option<bool>,
    default_headers: Headers,
    retry_delay: Duration,
    failure_policy: ConfiguratorFailurePolicy,
}

// Verify ClientConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ClientConfig>();
};

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_timeout: None,
            default_ttl: DEFAULT_TTL,
            default_repeat_request: 0,
            default_cache: false,
            default_with_credentials: None,
            default_headers: Headers::new(),
            retry_delay: Duration::ZERO,
            failure_policy: ConfiguratorFailurePolicy::Retry,
        }
    }
}

impl ClientConfig {
    /// Creates a new builder for constructing a `ClientConfig`.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Returns the default transport attempt timeout.
    #[must_use]
    pub const fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout
    }

    /// Returns the default cache entry lifetime.
    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Returns the default number of retries after a transport failure.
    #[must_use]
    pub const fn default_repeat_request(&self) -> u32 {
        self.default_repeat_request
    }

    /// Returns whether operations use the response cache by default.
    #[must_use]
    pub const fn default_cache(&self) -> bool {
        self.default_cache
    }

    /// Returns the default credentials flag.
    #[must_use]
    pub const fn default_with_credentials(&self) -> Option<bool> {
        self.default_with_credentials
    }

    /// Returns the headers sent with every request.
    #[must_use]
    pub const fn default_headers(&self) -> &Headers {
        &self.default_headers
    }

    /// Returns the pause between two transport attempts.
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Returns the configurator failure policy.
    #[must_use]
    pub const fn failure_policy(&self) -> ConfiguratorFailurePolicy {
        self.failure_policy
    }

    /// Applies these defaults to caller options.
    ///
    /// Returns the resolved options and the merged request headers.
    #[must_use]
    pub fn resolve(&self, options: &RequestOptions) -> (ResolvedOptions, Headers) {
        let resolved = ResolvedOptions {
            timeout: options.timeout.or(self.default_timeout),
            ttl: options.ttl.unwrap_or(self.default_ttl),
            repeat_request: options
                .repeat_request
                .unwrap_or(self.default_repeat_request),
            cache: options.cache.unwrap_or(self.default_cache),
            with_credentials: options.with_credentials.or(self.default_with_credentials),
        };
        let headers = self.default_headers.clone().merged_with(&options.headers);
        (resolved, headers)
    }
}

/// Builder for constructing [`ClientConfig`] instances.
///
/// # Defaults
///
/// - `default_timeout`: `None` (unbounded)
/// - `default_ttl`: [`DEFAULT_TTL`]
/// - `default_repeat_request`: `0`
/// - `default_cache`: `false`
/// - `default_with_credentials`: `None`
/// - `default_headers`: empty
/// - `retry_delay`: zero
/// - `failure_policy`: [`ConfiguratorFailurePolicy::Retry`]
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    default_timeout: Option<Duration>,
    default_ttl: Option<Duration>,
    default_repeat_request: Option<u32>,
    default_cache: Option<bool>,
    default_with_credentials: Option<bool>,
    default_headers: Vec<(String, String)>,
    retry_delay: Option<Duration>,
    failure_policy: Option<ConfiguratorFailurePolicy>,
}

impl ClientConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default transport attempt timeout.
    #[must_use]
    pub const fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Sets the default cache entry lifetime.
    #[must_use]
    pub const fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Sets the default number of retries after a transport failure.
    #[must_use]
    pub const fn default_repeat_request(mut self, repeat_request: u32) -> Self {
        self.default_repeat_request = Some(repeat_request);
        self
    }

    /// Sets whether operations use the response cache by default.
    #[must_use]
    pub const fn default_cache(mut self, cache: bool) -> Self {
        self.default_cache = Some(cache);
        self
    }

    /// Sets the default credentials flag.
    #[must_use]
    pub const fn default_with_credentials(mut self, with_credentials: bool) -> Self {
        self.default_with_credentials = Some(with_credentials);
        self
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Sets the pause between two transport attempts.
    #[must_use]
    pub const fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    /// Sets the configurator failure policy.
    #[must_use]
    pub const fn failure_policy(mut self, policy: ConfiguratorFailurePolicy) -> Self {
        self.failure_policy = Some(policy);
        self
    }

    /// Builds the [`ClientConfig`], validating the default headers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHeaderName`] if a default header name is
    /// empty or whitespace only.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let mut default_headers = Headers::new();
        for (name, value) in self.default_headers {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidHeaderName { name });
            }
            default_headers.insert(name, value);
        }

        Ok(ClientConfig {
            default_timeout: self.default_timeout,
            default_ttl: self.default_ttl.unwrap_or(DEFAULT_TTL),
            default_repeat_request: self.default_repeat_request.unwrap_or(0),
            default_cache: self.default_cache.unwrap_or(false),
            default_with_credentials: self.default_with_credentials,
            default_headers,
            retry_delay: self.retry_delay.unwrap_or(Duration::ZERO),
            failure_policy: self.failure_policy.unwrap_or_default(),
        })
    }
}
