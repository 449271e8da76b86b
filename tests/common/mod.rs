//! Mock collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rest_resources::{
    AgentResponse, BoxFuture, ConfigurationError, Configurator, EntityId, Headers, HttpAgent,
    HttpMethod, LinkGenerator, Parameters, ParentEntity, PreProcessed, ProcessorError, Request,
    RequestPreProcessor, Resource, Response, ResponsePostProcessor, RestClient,
    RestClientBuilder, TransportError, TransportOptions,
};
use serde_json::{json, Value};

// ============================================================================
// Transport
// ============================================================================

/// One call received by [`MockAgent`].
#[derive(Clone, Debug)]
pub struct Call {
    pub method: HttpMethod,
    pub url: String,
    pub data: Option<Value>,
    pub options: TransportOptions,
}

/// Records every call and answers from a script, falling back to a
/// `200 {"ok": true}` response once the script is exhausted.
#[derive(Default)]
pub struct MockAgent {
    calls: Mutex<Vec<Call>>,
    script: Mutex<VecDeque<Result<AgentResponse, TransportError>>>,
    delay: Option<Duration>,
}

impl MockAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripted(results: Vec<Result<AgentResponse, TransportError>>) -> Self {
        Self {
            script: Mutex::new(results.into()),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl HttpAgent for MockAgent {
    fn send<'a>(
        &'a self,
        method: HttpMethod,
        url: &'a str,
        data: Option<&'a Value>,
        options: &'a TransportOptions,
    ) -> BoxFuture<'a, Result<AgentResponse, TransportError>> {
        self.calls.lock().unwrap().push(Call {
            method,
            url: url.to_string(),
            data: data.cloned(),
            options: options.clone(),
        });
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ok(json!({"ok": true}))));
        let delay = self.delay;

        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            next
        })
    }
}

pub fn ok(body: Value) -> AgentResponse {
    AgentResponse::new(200, body, Headers::new())
}

pub fn status(status: u16) -> AgentResponse {
    AgentResponse::new(status, json!({"error": status}), Headers::new())
}

pub fn network_error() -> TransportError {
    TransportError::Network {
        message: "connection reset".to_string(),
    }
}

// ============================================================================
// Link generation
// ============================================================================

/// Arguments received by [`RecordingLinks`].
#[derive(Clone, Debug)]
pub struct LinkCall {
    pub parent: Option<ParentEntity>,
    pub resource: String,
    pub id: Option<EntityId>,
    pub parameters: Parameters,
    pub server_configuration: Option<Value>,
}

/// Builds `https://x/{parent}/{parent_id}/{resource}/{id}` (or a fixed URL)
/// and records its arguments.
#[derive(Default)]
pub struct RecordingLinks {
    fixed: Option<String>,
    calls: Mutex<Vec<LinkCall>>,
}

impl RecordingLinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fixed(url: &str) -> Self {
        Self {
            fixed: Some(url.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<LinkCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl LinkGenerator for RecordingLinks {
    fn create_link(
        &self,
        parent_entity: Option<&ParentEntity>,
        resource: &Resource,
        id: Option<&EntityId>,
        parameters: &Parameters,
        server_configuration: Option<&Value>,
    ) -> String {
        self.calls.lock().unwrap().push(LinkCall {
            parent: parent_entity.cloned(),
            resource: resource.name().to_string(),
            id: id.cloned(),
            parameters: parameters.clone(),
            server_configuration: server_configuration.cloned(),
        });

        if let Some(url) = &self.fixed {
            return url.clone();
        }
        let mut url = "https://x".to_string();
        if let Some(parent) = parent_entity {
            url.push_str(&format!("/{}", parent.resource()));
            if let Some(parent_id) = parent.id() {
                url.push_str(&format!("/{parent_id}"));
            }
        }
        url.push_str(&format!("/{resource}"));
        if let Some(id) = id {
            url.push_str(&format!("/{id}"));
        }
        let query: Vec<String> = parameters
            .iter()
            .map(|(name, value)| match value.as_str() {
                Some(text) => format!("{name}={text}"),
                None => format!("{name}={value}"),
            })
            .collect();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }
        url
    }
}

// ============================================================================
// Configurator
// ============================================================================

/// Counts calls; the first `failures` calls fail.
pub struct CountingConfigurator {
    calls: AtomicUsize,
    failures: usize,
    delay: Duration,
    configuration: Option<Value>,
}

impl CountingConfigurator {
    pub fn new(configuration: Option<Value>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failures: 0,
            delay: Duration::ZERO,
            configuration,
        }
    }

    pub fn failing_first(mut self, failures: usize) -> Self {
        self.failures = failures;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Configurator for CountingConfigurator {
    fn get_configuration(&self) -> BoxFuture<'_, Result<Option<Value>, ConfigurationError>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Box::pin(async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if call <= self.failures {
                Err(ConfigurationError::new("configuration endpoint unreachable"))
            } else {
                Ok(self.configuration.clone())
            }
        })
    }
}

// ============================================================================
// Processors
// ============================================================================

/// Pre-processor backed by a closure.
pub struct Pre<F>(pub F);

impl<F> RequestPreProcessor for Pre<F>
where
    F: Fn(Request) -> Result<PreProcessed, ProcessorError> + Send + Sync,
{
    fn process(&self, request: Request) -> BoxFuture<'_, Result<PreProcessed, ProcessorError>> {
        let result = (self.0)(request);
        Box::pin(async move { result })
    }
}

/// Post-processor backed by a closure.
pub struct Post<F>(pub F);

impl<F> ResponsePostProcessor for Post<F>
where
    F: Fn(Response) -> Result<Response, ProcessorError> + Send + Sync,
{
    fn process(&self, response: Response) -> BoxFuture<'_, Result<Response, ProcessorError>> {
        let result = (self.0)(response);
        Box::pin(async move { result })
    }
}

pub fn pre<F>(process: F) -> Arc<dyn RequestPreProcessor>
where
    F: Fn(Request) -> Result<PreProcessed, ProcessorError> + Send + Sync + 'static,
{
    Arc::new(Pre(process))
}

pub fn post<F>(process: F) -> Arc<dyn ResponsePostProcessor>
where
    F: Fn(Response) -> Result<Response, ProcessorError> + Send + Sync + 'static,
{
    Arc::new(Post(process))
}

// ============================================================================
// Client
// ============================================================================

pub fn builder(agent: &Arc<MockAgent>, links: &Arc<RecordingLinks>) -> RestClientBuilder {
    RestClient::builder()
        .agent(agent.clone())
        .link_generator(links.clone())
}

pub fn client(agent: &Arc<MockAgent>) -> RestClient {
    builder(agent, &Arc::new(RecordingLinks::new()))
        .build()
        .unwrap()
}
