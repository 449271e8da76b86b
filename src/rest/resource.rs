//! Typed entities.
//!
//! This module defines the [`EntityType`] trait, which describes how a
//! serde-derived struct maps onto a REST resource, and the [`Entity`]
//! wrapper, which binds such a struct to the client that fetched it.
//!
//! # Implementing an Entity Type
//!
//! 1. Define a struct with serde derives
//! 2. Implement `EntityType`, setting at least `RESOURCE_NAME`
//! 3. Override `serialize_data` / `deserialize_data` if the wire format
//!    differs from the struct's serde form
//!
//! # Example
//!
//! ```rust,ignore
//! use rest_resources::rest::{Entity, EntityResult, EntityType};
//! use rest_resources::{Parameters, RequestOptions};
//! use serde::{Deserialize, Serialize};
//! use serde_json::{Map, Value};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Article {
//!     pub id: Option<u64>,
//!     pub title: String,
//!     #[serde(default, skip_serializing_if = "Option::is_none")]
//!     pub slug: Option<String>,
//! }
//!
//! impl EntityType for Article {
//!     const RESOURCE_NAME: &'static str = "articles";
//!     const INLINE_RESPONSE_BODY: bool = true;
//!
//!     fn deserialize_data(mut data: Map<String, Value>) -> Map<String, Value> {
//!         let slug = data["title"].as_str().unwrap_or_default().to_lowercase().replace(' ', "-");
//!         data.insert("slug".to_string(), Value::from(slug));
//!         data
//!     }
//!
//!     fn serialize_data(mut data: Map<String, Value>) -> Map<String, Value> {
//!         data.remove("slug");
//!         data
//!     }
//! }
//!
//! // Usage:
//! let articles = Article::list(&client, Parameters::new(), RequestOptions::new()).await?;
//! if let EntityResult::Many(mut articles) = articles {
//!     let mut changes = Map::new();
//!     changes.insert("title".to_string(), Value::from("Renamed"));
//!     articles[0].patch(changes, RequestOptions::new()).await?;
//! }
//! ```

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::clients::rest::{Operation, RestClient, RestError};
use crate::clients::{HttpMethod, Parameters, RequestOptions};
use crate::rest::{EntityId, EntityResult, ParentEntity, Resource};

/// Static identity of an entity type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityMetadata {
    /// Name of the resource the entity belongs to.
    pub resource_name: &'static str,
    /// Name of the property holding the entity's primary key.
    pub id_field_name: &'static str,
    /// Whether operations return entities instead of the response envelope.
    pub inline_response_body: bool,
}

/// A struct that represents the entities of one REST resource.
///
/// # Associated Constants
///
/// - `RESOURCE_NAME`: the resource the entities belong to (e.g., "articles")
/// - `ID_FIELD_NAME`: the property holding the primary key (default `"id"`)
/// - `INLINE_RESPONSE_BODY`: when `true`, operations return
///   [`EntityResult::Single`] / [`EntityResult::Many`] / [`EntityResult::Empty`]
///   built from the response body instead of [`EntityResult::Envelope`]
///
/// # Marshalling Hooks
///
/// Entity state is converted through its serde form (a JSON object).
/// [`serialize_data`](EntityType::serialize_data) turns that object into the
/// wire payload; [`deserialize_data`](EntityType::deserialize_data) turns a
/// wire payload back into the object the struct is deserialized from. Both
/// default to the identity. Fields synthesized by `deserialize_data` are sent
/// back to the server unless `serialize_data` removes them.
#[allow(async_fn_in_trait)]
pub trait EntityType: Serialize + DeserializeOwned + Clone + Send + Sync + Sized {
    /// Name of the resource the entities belong to.
    const RESOURCE_NAME: &'static str;

    /// Name of the property holding the entity's primary key.
    const ID_FIELD_NAME: &'static str = "id";

    /// Whether operations return entities instead of the response envelope.
    const INLINE_RESPONSE_BODY: bool = false;

    /// Returns the static identity of this entity type.
    #[must_use]
    fn metadata() -> EntityMetadata {
        EntityMetadata {
            resource_name: Self::RESOURCE_NAME,
            id_field_name: Self::ID_FIELD_NAME,
            inline_response_body: Self::INLINE_RESPONSE_BODY,
        }
    }

    /// Returns the resource token of this entity type.
    #[must_use]
    fn resource() -> Resource {
        Resource::new(Self::RESOURCE_NAME)
    }

    /// Converts entity state into the wire payload.
    #[must_use]
    fn serialize_data(data: Map<String, Value>) -> Map<String, Value> {
        data
    }

    /// Converts a wire payload into entity state.
    #[must_use]
    fn deserialize_data(data: Map<String, Value>) -> Map<String, Value> {
        data
    }

    /// Lists the entities of this resource.
    ///
    /// # Errors
    ///
    /// Returns a [`RestError`] if the pipeline fails or, with an inline
    /// response body, if the body does not deserialize into entities.
    async fn list(
        client: &Arc<RestClient>,
        parameters: Parameters,
        options: RequestOptions,
    ) -> Result<EntityResult<Self>, RestError> {
        let resource = Self::resource();
        let response = client.list(&resource, parameters, options).await?;
        EntityResult::from_response(response, client)
    }

    /// Retrieves one or more entities by id.
    ///
    /// # Errors
    ///
    /// See [`EntityType::list`].
    async fn get(
        client: &Arc<RestClient>,
        id: impl Into<EntityId> + Send,
        parameters: Parameters,
        options: RequestOptions,
    ) -> Result<EntityResult<Self>, RestError> {
        let resource = Self::resource();
        let response = client.get(&resource, id, parameters, options).await?;
        EntityResult::from_response(response, client)
    }

    /// Creates an entity from the given state.
    ///
    /// # Errors
    ///
    /// See [`EntityType::list`]. Also fails with
    /// [`RestError::Serialization`] if the state is not a JSON object.
    async fn create(
        client: &Arc<RestClient>,
        state: &Self,
        options: RequestOptions,
    ) -> Result<EntityResult<Self>, RestError> {
        let resource = Self::resource();
        let payload = Value::Object(Self::serialize_data(state_map(state)?));
        let response = client.create(&resource, payload, options).await?;
        EntityResult::from_response(response, client)
    }

    /// Deletes one or more entities by id.
    ///
    /// # Errors
    ///
    /// See [`EntityType::list`].
    async fn delete(
        client: &Arc<RestClient>,
        id: impl Into<EntityId> + Send,
        options: RequestOptions,
    ) -> Result<EntityResult<Self>, RestError> {
        let resource = Self::resource();
        let response = client.delete(&resource, id, options).await?;
        EntityResult::from_response(response, client)
    }
}

/// Converts entity state into its serde object form.
fn state_map<T: Serialize>(state: &T) -> Result<Map<String, Value>, RestError> {
    match serde_json::to_value(state)? {
        Value::Object(map) => Ok(map),
        other => Err(RestError::Serialization(serde::ser::Error::custom(
            format!("entity state must serialize to a JSON object, got {other}"),
        ))),
    }
}

/// An entity bound to the client that fetched or created it.
///
/// `Entity<T>` dereferences to `T`, so fields are read and written directly.
/// The client and parent entity are private; they are used by the instance
/// operations and never serialized.
///
/// `patch`, `replace` and `create` update the local state only after the
/// server accepted the operation; `delete` consumes the entity.
#[derive(Clone)]
pub struct Entity<T: EntityType> {
    state: T,
    client: Arc<RestClient>,
    parent: Option<ParentEntity>,
}

impl<T: EntityType> Entity<T> {
    /// Wraps entity state.
    #[must_use]
    pub const fn new(client: Arc<RestClient>, state: T) -> Self {
        Self {
            state,
            client,
            parent: None,
        }
    }

    /// Wraps entity state belonging to a parent entity.
    #[must_use]
    pub const fn with_parent(client: Arc<RestClient>, state: T, parent: ParentEntity) -> Self {
        Self {
            state,
            client,
            parent: Some(parent),
        }
    }

    /// Builds an entity from a wire payload, applying
    /// [`EntityType::deserialize_data`].
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Serialization`] if the payload does not
    /// deserialize into `T`.
    pub fn from_wire(
        client: Arc<RestClient>,
        payload: Value,
        parent: Option<ParentEntity>,
    ) -> Result<Self, RestError> {
        let payload = match payload {
            Value::Object(map) => Value::Object(T::deserialize_data(map)),
            other => other,
        };
        Ok(Self {
            state: serde_json::from_value(payload)?,
            client,
            parent,
        })
    }

    /// Returns the entity state.
    #[must_use]
    pub const fn state(&self) -> &T {
        &self.state
    }

    /// Unwraps the entity state.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.state
    }

    /// Returns the client this entity is bound to.
    #[must_use]
    pub const fn client(&self) -> &Arc<RestClient> {
        &self.client
    }

    /// Returns the entity within which this entity was fetched, if any.
    #[must_use]
    pub const fn parent_entity(&self) -> Option<&ParentEntity> {
        self.parent.as_ref()
    }

    /// Returns the entity's id, read from its `ID_FIELD_NAME` property.
    #[must_use]
    pub fn id(&self) -> Option<EntityId> {
        let state = serde_json::to_value(&self.state).ok()?;
        state.get(T::ID_FIELD_NAME).and_then(EntityId::from_value)
    }

    /// Returns a snapshot of this entity for use as a parent of
    /// sub-resource operations.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Serialization`] if the state cannot be serialized.
    pub fn as_parent(&self) -> Result<ParentEntity, RestError> {
        let data = Value::Object(state_map(&self.state)?);
        let id = data.get(T::ID_FIELD_NAME).and_then(EntityId::from_value);
        Ok(ParentEntity::new(T::resource(), id, data))
    }

    /// Lists a sub-resource of this entity.
    ///
    /// # Errors
    ///
    /// See [`EntityType::list`].
    pub async fn list<S: EntityType>(
        &self,
        parameters: Parameters,
        options: RequestOptions,
    ) -> Result<EntityResult<S>, RestError> {
        let parent = self.as_parent()?;
        let resource = S::resource();
        let response = self
            .client
            .within(&parent)
            .list(&resource, parameters, options)
            .await?;
        EntityResult::from_response(response, &self.client)
    }

    /// Retrieves sub-resource entities of this entity by id.
    ///
    /// # Errors
    ///
    /// See [`EntityType::get`].
    pub async fn get<S: EntityType>(
        &self,
        id: impl Into<EntityId>,
        parameters: Parameters,
        options: RequestOptions,
    ) -> Result<EntityResult<S>, RestError> {
        let parent = self.as_parent()?;
        let resource = S::resource();
        let response = self
            .client
            .within(&parent)
            .get(&resource, id, parameters, options)
            .await?;
        EntityResult::from_response(response, &self.client)
    }

    /// Creates this entity in its resource.
    ///
    /// # Errors
    ///
    /// See [`EntityType::create`].
    pub async fn create(&mut self, options: RequestOptions) -> Result<EntityResult<T>, RestError> {
        let wire = T::serialize_data(state_map(&self.state)?);
        let resource = T::resource();
        let response = self
            .client
            .execute(Operation {
                data: Some(Value::Object(wire.clone())),
                options,
                parent: self.parent.as_ref(),
                ..Operation::new(HttpMethod::Post, &resource)
            })
            .await?;

        self.assign(wire)?;
        EntityResult::from_response(response, &self.client)
    }

    /// Partially updates this entity with `data`, given in the entity's
    /// serde form.
    ///
    /// After the server accepted the update, the properties in `data`
    /// overwrite the local ones; properties absent from `data` are kept.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::MissingEntityId`] if the entity has no id. See
    /// [`EntityType::list`] for the other cases.
    pub async fn patch(
        &mut self,
        data: Map<String, Value>,
        options: RequestOptions,
    ) -> Result<EntityResult<T>, RestError> {
        let id = self.require_id()?;
        let changes = T::serialize_data(data);
        let resource = T::resource();
        let response = self
            .client
            .execute(Operation {
                id: Some(id),
                data: Some(Value::Object(changes.clone())),
                options,
                parent: self.parent.as_ref(),
                ..Operation::new(HttpMethod::Patch, &resource)
            })
            .await?;

        let mut merged = T::serialize_data(state_map(&self.state)?);
        merged.extend(changes);
        self.assign(merged)?;
        EntityResult::from_response(response, &self.client)
    }

    /// Replaces this entity in its resource with the current state.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::MissingEntityId`] if the entity has no id. See
    /// [`EntityType::list`] for the other cases.
    pub async fn replace(&mut self, options: RequestOptions) -> Result<EntityResult<T>, RestError> {
        let id = self.require_id()?;
        let wire = T::serialize_data(state_map(&self.state)?);
        let resource = T::resource();
        let response = self
            .client
            .execute(Operation {
                id: Some(id),
                data: Some(Value::Object(wire.clone())),
                options,
                parent: self.parent.as_ref(),
                ..Operation::new(HttpMethod::Put, &resource)
            })
            .await?;

        self.assign(wire)?;
        EntityResult::from_response(response, &self.client)
    }

    /// Deletes this entity from its resource.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::MissingEntityId`] if the entity has no id. See
    /// [`EntityType::list`] for the other cases.
    pub async fn delete(self, options: RequestOptions) -> Result<EntityResult<T>, RestError> {
        let id = self.require_id()?;
        let resource = T::resource();
        let response = self
            .client
            .execute(Operation {
                id: Some(id),
                options,
                parent: self.parent.as_ref(),
                ..Operation::new(HttpMethod::Delete, &resource)
            })
            .await?;
        EntityResult::from_response(response, &self.client)
    }

    fn require_id(&self) -> Result<EntityId, RestError> {
        self.id().ok_or_else(|| RestError::MissingEntityId {
            resource: T::resource(),
            field: T::ID_FIELD_NAME,
        })
    }

    /// Replaces the local state with a server-confirmed wire payload.
    fn assign(&mut self, wire: Map<String, Value>) -> Result<(), RestError> {
        self.state = serde_json::from_value(Value::Object(T::deserialize_data(wire)))?;
        Ok(())
    }
}

impl<T: EntityType> Deref for Entity<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

impl<T: EntityType> DerefMut for Entity<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.state
    }
}

impl<T: EntityType + fmt::Debug> fmt::Debug for Entity<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("state", &self.state)
            .field("parent", &self.parent)
            .finish_non_exhaustive()
    }
}
