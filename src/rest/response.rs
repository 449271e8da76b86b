//! Results of entity operations.
//!
//! Entity types that declare `INLINE_RESPONSE_BODY = true` receive the
//! response body unwrapped into entities; all others receive the response
//! envelope unchanged.
//!
//! # Example
//!
//! ```rust,ignore
//! use rest_resources::rest::EntityResult;
//!
//! match Article::list(&client, Parameters::new(), RequestOptions::new()).await? {
//!     EntityResult::Many(articles) => {
//!         for article in &articles {
//!             println!("{}", article.title);
//!         }
//!     }
//!     EntityResult::Single(article) => println!("{}", article.title),
//!     EntityResult::Empty => println!("nothing returned"),
//!     EntityResult::Envelope(response) => println!("{}", response.body()),
//! }
//! ```

use std::sync::Arc;

use serde_json::Value;

use crate::clients::rest::{RestClient, RestError};
use crate::clients::Response;
use crate::rest::{Entity, EntityType};

/// The outcome of an entity operation.
#[derive(Clone)]
pub enum EntityResult<T: EntityType> {
    /// The post-processed response, for entity types without an inline
    /// response body.
    Envelope(Response),
    /// The body was a single JSON object.
    Single(Entity<T>),
    /// The body was a JSON array.
    Many(Vec<Entity<T>>),
    /// The body was `null` or absent.
    Empty,
}

impl<T: EntityType> EntityResult<T> {
    /// Unwraps a response according to `T::INLINE_RESPONSE_BODY`.
    ///
    /// Inline entities are bound to `client` and to the parent entity of the
    /// request that produced the response.
    pub(crate) fn from_response(
        response: Response,
        client: &Arc<RestClient>,
    ) -> Result<Self, RestError> {
        if !T::INLINE_RESPONSE_BODY {
            return Ok(Self::Envelope(response));
        }

        let parent = response.request().parent_entity().cloned();
        match response.body() {
            Value::Null => Ok(Self::Empty),
            Value::Array(items) => items
                .iter()
                .map(|item| Entity::from_wire(Arc::clone(client), item.clone(), parent.clone()))
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Many),
            Value::Object(_) => {
                Entity::from_wire(Arc::clone(client), response.body().clone(), parent)
                    .map(Self::Single)
            }
            other => Err(RestError::Serialization(serde::de::Error::custom(format!(
                "expected an entity object or array in the response body, got {other}"
            )))),
        }
    }

    /// Returns the response envelope, if this result carries one.
    #[must_use]
    pub fn into_response(self) -> Option<Response> {
        match self {
            Self::Envelope(response) => Some(response),
            _ => None,
        }
    }

    /// Returns the single entity, if this result carries one.
    #[must_use]
    pub fn into_single(self) -> Option<Entity<T>> {
        match self {
            Self::Single(entity) => Some(entity),
            _ => None,
        }
    }

    /// Returns the entities of this result.
    ///
    /// A single entity becomes a one-element vector; envelopes and empty
    /// results give an empty vector.
    #[must_use]
    pub fn into_many(self) -> Vec<Entity<T>> {
        match self {
            Self::Many(entities) => entities,
            Self::Single(entity) => vec![entity],
            Self::Envelope(_) | Self::Empty => Vec::new(),
        }
    }

    /// Returns `true` for [`EntityResult::Empty`].
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl<T: EntityType + std::fmt::Debug> std::fmt::Debug for EntityResult<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Envelope(response) => f.debug_tuple("Envelope").field(response).finish(),
            Self::Single(entity) => f.debug_tuple("Single").field(entity).finish(),
            Self::Many(entities) => f.debug_tuple("Many").field(entities).finish(),
            Self::Empty => f.write_str("Empty"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::rest::LinkGenerator;
    use crate::clients::{
        AgentResponse, BoxFuture, Headers, HttpAgent, HttpMethod, Parameters, Request,
        TransportError, TransportOptions,
    };
    use crate::rest::{EntityId, ParentEntity, Resource};
    use serde::{Deserialize, Serialize};
    use serde_json::{json, Map};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Comment {
        id: i64,
        text: String,
        #[serde(default)]
        shouting: String,
    }

    impl EntityType for Comment {
        const RESOURCE_NAME: &'static str = "comments";
        const INLINE_RESPONSE_BODY: bool = true;

        fn deserialize_data(mut data: Map<String, Value>) -> Map<String, Value> {
            let shouting = data
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_uppercase();
            data.insert("shouting".to_string(), Value::from(shouting));
            data
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Raw {
        id: i64,
    }

    impl EntityType for Raw {
        const RESOURCE_NAME: &'static str = "raw";
    }

    struct NoAgent;

    impl HttpAgent for NoAgent {
        fn send<'a>(
            &'a self,
            _method: HttpMethod,
            _url: &'a str,
            _data: Option<&'a Value>,
            _options: &'a TransportOptions,
        ) -> BoxFuture<'a, Result<AgentResponse, TransportError>> {
            Box::pin(async {
                Err(TransportError::Network {
                    message: "unused".to_string(),
                })
            })
        }
    }

    struct NoLinks;

    impl LinkGenerator for NoLinks {
        fn create_link(
            &self,
            _parent_entity: Option<&ParentEntity>,
            _resource: &Resource,
            _id: Option<&EntityId>,
            _parameters: &Parameters,
            _server_configuration: Option<&Value>,
        ) -> String {
            String::new()
        }
    }

    fn client() -> Arc<RestClient> {
        Arc::new(
            RestClient::builder()
                .agent(Arc::new(NoAgent))
                .link_generator(Arc::new(NoLinks))
                .build()
                .unwrap(),
        )
    }

    fn response(body: Value, parent: Option<ParentEntity>) -> Response {
        let request = Request::builder(HttpMethod::Get, "https://x/comments", Resource::new("comments"))
            .parent_entity(parent)
            .build();
        Response::new(200, Headers::new(), body, request)
    }

    #[test]
    fn test_envelope_when_body_is_not_inlined() {
        let result: EntityResult<Raw> =
            EntityResult::from_response(response(json!({"id": 1}), None), &client()).unwrap();

        let envelope = result.into_response().unwrap();
        assert_eq!(envelope.body(), &json!({"id": 1}));
    }

    #[test]
    fn test_object_body_becomes_single_entity() {
        let result: EntityResult<Comment> =
            EntityResult::from_response(response(json!({"id": 1, "text": "hi"}), None), &client())
                .unwrap();

        let comment = result.into_single().unwrap();
        assert_eq!(comment.text, "hi");
        assert_eq!(comment.shouting, "HI");
    }

    #[test]
    fn test_array_body_becomes_entities_bound_to_parent() {
        let parent = ParentEntity::new(Resource::new("articles"), Some(EntityId::from(4)), json!({}));
        let body = json!([{"id": 1, "text": "a"}, {"id": 2, "text": "b"}]);

        let result: EntityResult<Comment> =
            EntityResult::from_response(response(body, Some(parent.clone())), &client()).unwrap();

        let comments = result.into_many();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[1].shouting, "B");
        assert!(comments
            .iter()
            .all(|comment| comment.parent_entity() == Some(&parent)));
    }

    #[test]
    fn test_null_body_is_empty() {
        let result: EntityResult<Comment> =
            EntityResult::from_response(response(Value::Null, None), &client()).unwrap();
        assert!(result.is_empty());
        assert!(result.into_many().is_empty());
    }

    #[test]
    fn test_scalar_body_is_a_serialization_error() {
        let result: Result<EntityResult<Comment>, _> =
            EntityResult::from_response(response(json!("ok"), None), &client());
        assert!(matches!(result, Err(RestError::Serialization(_))));
    }
}
