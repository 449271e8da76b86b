//! Resource and entity identity types.
//!
//! - [`Resource`]: the opaque token naming a REST resource
//! - [`EntityId`]: a single identifier or an ordered group of identifiers
//! - [`ParentEntity`]: a snapshot of the entity owning a sub-resource

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// The identifier of a REST resource.
///
/// The token is opaque to the client: only the link generator and the
/// request/response processors interpret it. Typed entities derive their
/// resource from [`EntityType::RESOURCE_NAME`](crate::rest::EntityType::RESOURCE_NAME).
///
/// # Example
///
/// ```rust
/// use rest_resources::Resource;
///
/// let resource = Resource::new("articles");
/// assert_eq!(resource.name(), "articles");
/// assert_eq!(resource, Resource::from("articles"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Resource(Cow<'static, str>);

impl Resource {
    /// Creates a resource token from a name.
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Returns the resource name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Resource {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for Resource {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

/// Identifier of a single entity, or of an ordered group of entities.
///
/// # Example
///
/// ```rust
/// use rest_resources::EntityId;
///
/// assert_eq!(EntityId::from(123).to_string(), "123");
/// assert_eq!(EntityId::from(vec![1, 2, 3]).to_string(), "1,2,3");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EntityId {
    /// A numeric identifier.
    Number(i64),
    /// A textual identifier.
    Text(String),
    /// An ordered group of identifiers for multi-entity operations.
    Many(Vec<EntityId>),
}

impl EntityId {
    /// Converts a JSON value into an identifier.
    ///
    /// Integers beyond `i64::MAX` become [`EntityId::Text`]. Returns `None`
    /// for `null`, booleans, objects, non-integral numbers and arrays
    /// containing any of those.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => match number.as_i64() {
                Some(number) => Some(Self::Number(number)),
                None => number.as_u64().map(|number| Self::Text(number.to_string())),
            },
            Value::String(text) => Some(Self::Text(text.clone())),
            Value::Array(items) => items
                .iter()
                .map(Self::from_value)
                .collect::<Option<Vec<_>>>()
                .map(Self::Many),
            _ => None,
        }
    }

    /// Converts the identifier into a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Number(number) => Value::from(*number),
            Self::Text(text) => Value::from(text.as_str()),
            Self::Many(ids) => Value::Array(ids.iter().map(Self::to_value).collect()),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
            Self::Many(ids) => {
                for (index, id) in ids.iter().enumerate() {
                    if index > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{id}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        Self::Number(id)
    }
}

impl From<i32> for EntityId {
    fn from(id: i32) -> Self {
        Self::Number(i64::from(id))
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self::Number(i64::from(id))
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self::Text(id)
    }
}

impl<T: Into<Self>> From<Vec<T>> for EntityId {
    fn from(ids: Vec<T>) -> Self {
        Self::Many(ids.into_iter().map(Into::into).collect())
    }
}

/// Snapshot of the entity within which a sub-resource is accessed.
///
/// The parent is threaded through link generation and every [`Request`] so
/// processors can build nested URLs or log the owner, but it is never sent
/// as payload. The snapshot does not own the parent entity; it only records
/// its resource, identifier and data at the time the request was issued.
///
/// [`Request`]: crate::clients::Request
#[derive(Clone, Debug, PartialEq)]
pub struct ParentEntity {
    resource: Resource,
    id: Option<EntityId>,
    data: Arc<Value>,
}

impl ParentEntity {
    /// Creates a parent snapshot.
    #[must_use]
    pub fn new(resource: Resource, id: Option<EntityId>, data: Value) -> Self {
        Self {
            resource,
            id,
            data: Arc::new(data),
        }
    }

    /// Returns the resource the parent entity belongs to.
    #[must_use]
    pub const fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Returns the parent entity's identifier, if it has one.
    #[must_use]
    pub const fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }

    /// Returns the parent entity's data as it was when the snapshot was taken.
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }
}
