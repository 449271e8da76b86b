//! Resource identity, link generation and typed entities.
//!
//! - **[`Resource`], [`EntityId`], [`ParentEntity`]**: how a request names
//!   what it operates on
//! - **[`BaseUrlLinkGenerator`]**: the default [`LinkGenerator`](crate::LinkGenerator)
//! - **[`EntityType`] trait**: maps a serde struct onto a resource, with
//!   marshalling hooks and static CRUD operations
//! - **[`Entity<T>`]**: a `Deref` wrapper binding entity state to its client,
//!   with instance operations (`patch`, `replace`, `create`, `delete`) and
//!   sub-resource access
//! - **[`EntityResult<T>`]**: the envelope or the inline entities returned by
//!   entity operations
//!
//! # Example
//!
//! ```rust,ignore
//! use rest_resources::rest::{Entity, EntityResult, EntityType};
//!
//! let blog = Blog::get(&client, 3, Parameters::new(), RequestOptions::new())
//!     .await?
//!     .into_single()
//!     .ok_or("blog not found")?;
//!
//! // GET {base}/blogs/3/articles
//! let articles = blog.list::<Article>(Parameters::new(), RequestOptions::new()).await?;
//! ```

mod identity;
mod path;
mod resource;
mod response;

pub use identity::{EntityId, ParentEntity, Resource};
pub use path::BaseUrlLinkGenerator;
pub use resource::{Entity, EntityMetadata, EntityType};
pub use response::EntityResult;
