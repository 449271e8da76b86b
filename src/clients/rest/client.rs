//! REST client orchestrator.
//!
//! This module provides the [`RestClient`] type, which runs every CRUD
//! operation through the same pipeline:
//!
//! 1. resolve the server configuration (memoized)
//! 2. generate the URL
//! 3. build the initial [`Request`]
//! 4. run the request pre-processors, stopping at the first one that answers
//! 5. serve from the cache, join an in-flight dispatch, or dispatch with retry
//! 6. run the response post-processors
//! 7. store the transport response in the cache

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::clients::rest::cache::{Fingerprint, InFlight, Lookup, ResponseCache, Settled};
use crate::clients::rest::errors::DispatchFailure;
use crate::clients::rest::memo::ConfigurationMemo;
use crate::clients::rest::{
    Configurator, LinkGenerator, PreProcessed, RequestPreProcessor,
    ResponsePostProcessor, RestError,
};
use crate::clients::{
    AgentResponse, HttpAgent, HttpMethod, Parameters, Request, RequestOptions, Response,
    TransportError, TransportOptions,
};
use crate::config::ClientConfig;
use crate::error::ConfigError;
use crate::rest::{EntityId, ParentEntity, Resource};

/// REST client composing the transport, link generator, configurator and
/// processor chains into CRUD operations.
///
/// # Thread Safety
///
/// `RestClient` is `Send + Sync`. Share it with `Arc<RestClient>`; entities
/// keep such an `Arc` to issue their own operations.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use rest_resources::{
///     BaseUrlLinkGenerator, Parameters, RequestOptions, Resource, ReqwestAgent, RestClient,
/// };
///
/// let client = RestClient::builder()
///     .agent(Arc::new(ReqwestAgent::new()))
///     .link_generator(Arc::new(BaseUrlLinkGenerator::new("https://api.example.com")?))
///     .build()?;
///
/// let response = client
///     .get(&Resource::new("articles"), 123, Parameters::new(), RequestOptions::new())
///     .await?;
/// println!("{}", response.body());
/// ```
pub struct RestClient {
    agent: Arc<dyn HttpAgent>,
    link_generator: Arc<dyn LinkGenerator>,
    configurator: Option<Arc<dyn Configurator>>,
    pre_processors: Vec<Arc<dyn RequestPreProcessor>>,
    post_processors: Vec<Arc<dyn ResponsePostProcessor>>,
    config: ClientConfig,
    server_configuration: ConfigurationMemo,
    cache: ResponseCache,
}

// Verify RestClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RestClient>();
};

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("has_configurator", &self.configurator.is_some())
            .field("pre_processors", &self.pre_processors.len())
            .field("post_processors", &self.post_processors.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// A single pipeline invocation.
pub(crate) struct Operation<'a> {
    pub(crate) method: HttpMethod,
    pub(crate) resource: &'a Resource,
    pub(crate) id: Option<EntityId>,
    pub(crate) parameters: Parameters,
    pub(crate) data: Option<Value>,
    pub(crate) options: RequestOptions,
    pub(crate) parent: Option<&'a ParentEntity>,
}

impl<'a> Operation<'a> {
    pub(crate) fn new(method: HttpMethod, resource: &'a Resource) -> Self {
        Self {
            method,
            resource,
            id: None,
            parameters: Parameters::new(),
            data: None,
            options: RequestOptions::default(),
            parent: None,
        }
    }
}

/// A transport-level response, plus the cache flight it must settle once
/// post-processing finished.
struct Fetched<'a> {
    response: Response,
    flight: Option<InFlight<'a>>,
}

impl RestClient {
    /// Creates a new builder for constructing a `RestClient`.
    #[must_use]
    pub fn builder() -> RestClientBuilder {
        RestClientBuilder::new()
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns a view of this client that issues every operation within the
    /// given parent entity.
    #[must_use]
    pub const fn within<'a>(&'a self, parent: &'a ParentEntity) -> SubResourceClient<'a> {
        SubResourceClient {
            client: self,
            parent,
        }
    }

    /// Drops every cached response.
    ///
    /// Dispatches already in flight are unaffected.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Lists the entities of a resource collection (GET).
    ///
    /// # Errors
    ///
    /// Returns a [`RestError`] naming the pipeline stage that failed.
    pub async fn list(
        &self,
        resource: &Resource,
        parameters: Parameters,
        options: RequestOptions,
    ) -> Result<Response, RestError> {
        self.execute(Operation {
            parameters,
            options,
            ..Operation::new(HttpMethod::Get, resource)
        })
        .await
    }

    /// Retrieves one or more identified entities (GET).
    ///
    /// # Errors
    ///
    /// Returns a [`RestError`] naming the pipeline stage that failed.
    pub async fn get(
        &self,
        resource: &Resource,
        id: impl Into<EntityId>,
        parameters: Parameters,
        options: RequestOptions,
    ) -> Result<Response, RestError> {
        self.execute(Operation {
            id: Some(id.into()),
            parameters,
            options,
            ..Operation::new(HttpMethod::Get, resource)
        })
        .await
    }

    /// Creates an entity (POST).
    ///
    /// # Errors
    ///
    /// Returns a [`RestError`] naming the pipeline stage that failed.
    pub async fn create(
        &self,
        resource: &Resource,
        data: Value,
        options: RequestOptions,
    ) -> Result<Response, RestError> {
        self.execute(Operation {
            data: Some(data),
            options,
            ..Operation::new(HttpMethod::Post, resource)
        })
        .await
    }

    /// Replaces an entity (PUT). Fields missing from `data` are cleared by
    /// the server.
    ///
    /// # Errors
    ///
    /// Returns a [`RestError`] naming the pipeline stage that failed.
    pub async fn replace(
        &self,
        resource: &Resource,
        id: impl Into<EntityId>,
        data: Value,
        options: RequestOptions,
    ) -> Result<Response, RestError> {
        self.execute(Operation {
            id: Some(id.into()),
            data: Some(data),
            options,
            ..Operation::new(HttpMethod::Put, resource)
        })
        .await
    }

    /// Partially updates an entity (PATCH). Fields missing from `data` are
    /// left untouched by the server.
    ///
    /// # Errors
    ///
    /// Returns a [`RestError`] naming the pipeline stage that failed.
    pub async fn patch(
        &self,
        resource: &Resource,
        id: impl Into<EntityId>,
        data: Value,
        options: RequestOptions,
    ) -> Result<Response, RestError> {
        self.execute(Operation {
            id: Some(id.into()),
            data: Some(data),
            options,
            ..Operation::new(HttpMethod::Patch, resource)
        })
        .await
    }

    /// Deletes one or more identified entities (DELETE).
    ///
    /// # Errors
    ///
    /// Returns a [`RestError`] naming the pipeline stage that failed.
    pub async fn delete(
        &self,
        resource: &Resource,
        id: impl Into<EntityId>,
        options: RequestOptions,
    ) -> Result<Response, RestError> {
        self.execute(Operation {
            id: Some(id.into()),
            options,
            ..Operation::new(HttpMethod::Delete, resource)
        })
        .await
    }

    /// Runs one operation through the whole pipeline.
    pub(crate) async fn execute(&self, operation: Operation<'_>) -> Result<Response, RestError> {
        let server_configuration = self.server_configuration().await?;

        let url = self.link_generator.create_link(
            operation.parent,
            operation.resource,
            operation.id.as_ref(),
            &operation.parameters,
            server_configuration.as_deref(),
        );
        tracing::debug!(
            method = %operation.method,
            resource = %operation.resource,
            url = %url,
            "Generated request link"
        );

        let (options, headers) = self.config.resolve(&operation.options);
        let request = Request::builder(operation.method, url, operation.resource.clone())
            .parent_entity(operation.parent.cloned())
            .parameters(operation.parameters)
            .data(operation.data)
            .headers(headers)
            .options(options)
            .server_configuration(server_configuration)
            .build();

        let fetched = match self.pre_process(request).await? {
            PreProcessed::Request(request) => self.fetch(request).await?,
            PreProcessed::Response(response) => Fetched {
                response,
                flight: None,
            },
        };

        let processed = self.post_process(fetched.response.clone()).await;

        // Identical requests keep waiting on the flight until this point.
        if let Some(flight) = fetched.flight {
            if processed.is_ok() {
                let ttl = fetched.response.request().options().ttl;
                flight.store(fetched.response, ttl);
            } else {
                flight.settle(Ok(fetched.response));
            }
        }

        processed
    }

    /// Resolves the server configuration, calling the configurator at most
    /// once while it succeeds.
    async fn server_configuration(&self) -> Result<Option<Arc<Value>>, RestError> {
        let Some(configurator) = &self.configurator else {
            return Ok(None);
        };

        self.server_configuration
            .resolve(configurator.as_ref(), self.config.failure_policy())
            .await
            .map_err(RestError::from)
    }

    async fn pre_process(&self, mut request: Request) -> Result<PreProcessed, RestError> {
        for (index, processor) in self.pre_processors.iter().enumerate() {
            let processed = processor
                .process(request)
                .await
                .map_err(|source| RestError::PreProcessor { index, source })?;

            match processed {
                PreProcessed::Request(next) => request = next,
                PreProcessed::Response(response) => {
                    tracing::debug!(
                        index,
                        status = response.status(),
                        "Request pre-processor answered the request"
                    );
                    return Ok(PreProcessed::Response(response));
                }
            }
        }
        Ok(PreProcessed::Request(request))
    }

    async fn post_process(&self, mut response: Response) -> Result<Response, RestError> {
        for (index, processor) in self.post_processors.iter().enumerate() {
            response = processor
                .process(response)
                .await
                .map_err(|source| RestError::PostProcessor { index, source })?;
        }
        tracing::debug!(
            status = response.status(),
            cached = response.cached(),
            "Post-processing complete"
        );
        Ok(response)
    }

    /// Serves the request from the cache or dispatches it.
    async fn fetch(&self, request: Request) -> Result<Fetched<'_>, RestError> {
        if !request.options().cache {
            let response = self.dispatch(&request).await?;
            return Ok(Fetched {
                response,
                flight: None,
            });
        }

        let key = Fingerprint::of(&request);
        loop {
            match self.cache.lookup(&key) {
                Lookup::Hit(cached) => {
                    tracing::debug!(url = request.url(), "Serving response from cache");
                    return Ok(Fetched {
                        response: cached.with_request(request).with_cached(true),
                        flight: None,
                    });
                }
                Lookup::Wait(mut receiver) => {
                    tracing::debug!(url = request.url(), "Joining in-flight request");
                    let settled: Option<Settled> = match receiver.wait_for(Option::is_some).await
                    {
                        Ok(settled) => (*settled).clone(),
                        Err(_) => None,
                    };
                    // A closed channel means the leader was dropped; look again.
                    if let Some(settled) = settled {
                        let shared = settled?;
                        return Ok(Fetched {
                            response: shared.with_request(request).with_cached(true),
                            flight: None,
                        });
                    }
                }
                Lookup::Lead(flight) => {
                    tracing::debug!(url = request.url(), "Cache miss, dispatching request");
                    return match self.dispatch(&request).await {
                        Ok(response) => Ok(Fetched {
                            response,
                            flight: Some(flight),
                        }),
                        Err(failure) => {
                            flight.settle(Err(failure.clone()));
                            Err(failure.into())
                        }
                    };
                }
            }
        }
    }

    /// Dispatches the request, retrying failed attempts up to
    /// `repeat_request` times.
    async fn dispatch(&self, request: &Request) -> Settled {
        let transport_options = request.transport_options();
        let max_attempts = request.options().max_attempts();
        let mut tries: u32 = 0;

        loop {
            tries += 1;

            let error = match self.attempt(request, &transport_options).await {
                Ok(agent_response) if agent_response.is_ok() => {
                    return Ok(Response::from_agent(agent_response, request.clone()));
                }
                Ok(agent_response) => TransportError::Status {
                    status: agent_response.status,
                    body: agent_response.body,
                },
                Err(error) => error,
            };

            if tries >= max_attempts {
                if max_attempts > 1 {
                    tracing::warn!(
                        method = %request.method(),
                        url = request.url(),
                        tries,
                        "Giving up on request: {}",
                        error
                    );
                }
                return Err(DispatchFailure { tries, error });
            }

            tracing::warn!(
                method = %request.method(),
                url = request.url(),
                attempt = tries,
                max_attempts,
                "Transport attempt failed, retrying: {}",
                error
            );

            let delay = self.config.retry_delay();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// Performs one transport attempt bounded by the request timeout.
    async fn attempt(
        &self,
        request: &Request,
        options: &TransportOptions,
    ) -> Result<AgentResponse, TransportError> {
        let url = request.url();
        let data = request.data();
        let call = match request.method() {
            HttpMethod::Get => self.agent.get(url, data, options),
            HttpMethod::Post => self.agent.post(url, data, options),
            HttpMethod::Patch => self.agent.patch(url, data, options),
            HttpMethod::Put => self.agent.put(url, data, options),
            HttpMethod::Delete => self.agent.delete(url, data, options),
        };

        match options.timeout {
            Some(timeout) => tokio::time::timeout(timeout, call)
                .await
                .unwrap_or(Err(TransportError::Timeout { timeout })),
            None => call.await,
        }
    }
}

/// A [`RestClient`] view whose operations run within a parent entity.
///
/// Obtained with [`RestClient::within`]. The parent is passed to the link
/// generator and recorded on every request, but never sent as payload.
#[derive(Clone, Copy, Debug)]
pub struct SubResourceClient<'a> {
    client: &'a RestClient,
    parent: &'a ParentEntity,
}

impl SubResourceClient<'_> {
    /// Returns the parent entity.
    #[must_use]
    pub const fn parent(&self) -> &ParentEntity {
        self.parent
    }

    /// Lists the sub-resource collection (GET).
    ///
    /// # Errors
    ///
    /// See [`RestClient::list`].
    pub async fn list(
        &self,
        resource: &Resource,
        parameters: Parameters,
        options: RequestOptions,
    ) -> Result<Response, RestError> {
        self.client
            .execute(Operation {
                parameters,
                options,
                parent: Some(self.parent),
                ..Operation::new(HttpMethod::Get, resource)
            })
            .await
    }

    /// Retrieves identified sub-resource entities (GET).
    ///
    /// # Errors
    ///
    /// See [`RestClient::get`].
    pub async fn get(
        &self,
        resource: &Resource,
        id: impl Into<EntityId>,
        parameters: Parameters,
        options: RequestOptions,
    ) -> Result<Response, RestError> {
        self.client
            .execute(Operation {
                id: Some(id.into()),
                parameters,
                options,
                parent: Some(self.parent),
                ..Operation::new(HttpMethod::Get, resource)
            })
            .await
    }

    /// Creates a sub-resource entity (POST).
    ///
    /// # Errors
    ///
    /// See [`RestClient::create`].
    pub async fn create(
        &self,
        resource: &Resource,
        data: Value,
        options: RequestOptions,
    ) -> Result<Response, RestError> {
        self.client
            .execute(Operation {
                data: Some(data),
                options,
                parent: Some(self.parent),
                ..Operation::new(HttpMethod::Post, resource)
            })
            .await
    }

    /// Replaces a sub-resource entity (PUT).
    ///
    /// # Errors
    ///
    /// See [`RestClient::replace`].
    pub async fn replace(
        &self,
        resource: &Resource,
        id: impl Into<EntityId>,
        data: Value,
        options: RequestOptions,
    ) -> Result<Response, RestError> {
        self.client
            .execute(Operation {
                id: Some(id.into()),
                data: Some(data),
                options,
                parent: Some(self.parent),
                ..Operation::new(HttpMethod::Put, resource)
            })
            .await
    }

    /// Partially updates a sub-resource entity (PATCH).
    ///
    /// # Errors
    ///
    /// See [`RestClient::patch`].
    pub async fn patch(
        &self,
        resource: &Resource,
        id: impl Into<EntityId>,
        data: Value,
        options: RequestOptions,
    ) -> Result<Response, RestError> {
        self.client
            .execute(Operation {
                id: Some(id.into()),
                data: Some(data),
                options,
                parent: Some(self.parent),
                ..Operation::new(HttpMethod::Patch, resource)
            })
            .await
    }

    /// Deletes sub-resource entities (DELETE).
    ///
    /// # Errors
    ///
    /// See [`RestClient::delete`].
    pub async fn delete(
        &self,
        resource: &Resource,
        id: impl Into<EntityId>,
        options: RequestOptions,
    ) -> Result<Response, RestError> {
        self.client
            .execute(Operation {
                id: Some(id.into()),
                options,
                parent: Some(self.parent),
                ..Operation::new(HttpMethod::Delete, resource)
            })
            .await
    }
}

/// Builder for constructing [`RestClient`] instances.
///
/// `agent` and `link_generator` are required. Processors run in the order
/// they are added.
///
/// # Defaults
///
/// - `configurator`: `None` (requests carry no server configuration)
/// - `pre_processors` / `post_processors`: empty
/// - `config`: [`ClientConfig::default`]
#[derive(Default)]
pub struct RestClientBuilder {
    agent: Option<Arc<dyn HttpAgent>>,
    link_generator: Option<Arc<dyn LinkGenerator>>,
    configurator: Option<Arc<dyn Configurator>>,
    pre_processors: Vec<Arc<dyn RequestPreProcessor>>,
    post_processors: Vec<Arc<dyn ResponsePostProcessor>>,
    config: Option<ClientConfig>,
}

impl fmt::Debug for RestClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClientBuilder")
            .field("has_agent", &self.agent.is_some())
            .field("has_link_generator", &self.link_generator.is_some())
            .field("has_configurator", &self.configurator.is_some())
            .field("pre_processors", &self.pre_processors.len())
            .field("post_processors", &self.post_processors.len())
            .field("config", &self.config)
            .finish()
    }
}

impl RestClientBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the transport (required).
    #[must_use]
    pub fn agent(mut self, agent: Arc<dyn HttpAgent>) -> Self {
        self.agent = Some(agent);
        self
    }

    /// Sets the link generator (required).
    #[must_use]
    pub fn link_generator(mut self, link_generator: Arc<dyn LinkGenerator>) -> Self {
        self.link_generator = Some(link_generator);
        self
    }

    /// Sets the configurator.
    #[must_use]
    pub fn configurator(mut self, configurator: Arc<dyn Configurator>) -> Self {
        self.configurator = Some(configurator);
        self
    }

    /// Appends a request pre-processor.
    #[must_use]
    pub fn pre_processor(mut self, processor: Arc<dyn RequestPreProcessor>) -> Self {
        self.pre_processors.push(processor);
        self
    }

    /// Appends a response post-processor.
    #[must_use]
    pub fn post_processor(mut self, processor: Arc<dyn ResponsePostProcessor>) -> Self {
        self.post_processors.push(processor);
        self
    }

    /// Sets the client configuration.
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the [`RestClient`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `agent` or
    /// `link_generator` is not set.
    pub fn build(self) -> Result<RestClient, ConfigError> {
        let agent = self
            .agent
            .ok_or(ConfigError::MissingRequiredField { field: "agent" })?;
        let link_generator = self
            .link_generator
            .ok_or(ConfigError::MissingRequiredField {
                field: "link_generator",
            })?;

        Ok(RestClient {
            agent,
            link_generator,
            configurator: self.configurator,
            pre_processors: self.pre_processors,
            post_processors: self.post_processors,
            config: self.config.unwrap_or_default(),
            server_configuration: ConfigurationMemo::new(),
            cache: ResponseCache::new(),
        })
    }
}
