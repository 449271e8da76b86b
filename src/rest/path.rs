//! Default link generator.
//!
//! [`BaseUrlLinkGenerator`] builds URLs below a fixed base URL. Without
//! templates every resource uses the nested layout
//! `{base}/{parent-resource}/{parent-id}/{resource}/{id}`, where the parent
//! and id segments are only present when known.
//!
//! # Path Templates
//!
//! A resource can register templates with `{name}` placeholders. `{id}` is
//! the entity id, `{parent_id}` the parent entity's id, and any other name is
//! taken from the request parameters. The most specific template whose
//! placeholders can all be filled is used; if none fits, the default layout
//! applies.
//!
//! Parameters not consumed by a placeholder become the query string.
//!
//! # Example
//!
//! ```rust
//! use rest_resources::rest::BaseUrlLinkGenerator;
//! use rest_resources::{EntityId, LinkGenerator, Parameters, Resource};
//! use serde_json::json;
//!
//! let links = BaseUrlLinkGenerator::new("https://api.example.com/v1")
//!     .unwrap()
//!     .template("variants", "products/{product_id}/variants/{id}")
//!     .template("variants", "variants/{id}");
//!
//! let mut parameters = Parameters::new();
//! parameters.insert("product_id".to_string(), json!(123));
//! parameters.insert("fields".to_string(), json!("id,title"));
//!
//! let url = links.create_link(
//!     None,
//!     &Resource::new("variants"),
//!     Some(&EntityId::from(456)),
//!     &parameters,
//!     None,
//! );
//! assert_eq!(url, "https://api.example.com/v1/products/123/variants/456?fields=id%2Ctitle");
//! ```

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use crate::clients::rest::LinkGenerator;
use crate::clients::Parameters;
use crate::error::ConfigError;
use crate::rest::{EntityId, ParentEntity, Resource};

/// [`LinkGenerator`] producing URLs below a fixed base URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaseUrlLinkGenerator {
    base_url: String,
    templates: HashMap<String, Vec<String>>,
}

// Verify BaseUrlLinkGenerator is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<BaseUrlLinkGenerator>();
};

impl BaseUrlLinkGenerator {
    /// Creates a link generator for the given base URL.
    ///
    /// Trailing slashes are removed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the URL has no scheme or
    /// no host.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ConfigError> {
        let base_url = base_url.into();
        let trimmed = base_url.trim().trim_end_matches('/');

        let valid = trimmed
            .split_once("://")
            .is_some_and(|(scheme, rest)| {
                !scheme.is_empty()
                    && scheme
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
                    && !rest.is_empty()
            });
        if !valid {
            return Err(ConfigError::InvalidBaseUrl { url: base_url });
        }

        Ok(Self {
            base_url: trimmed.to_string(),
            templates: HashMap::new(),
        })
    }

    /// Registers a path template for a resource.
    ///
    /// Templates are relative to the base URL and may be registered several
    /// times per resource.
    #[must_use]
    pub fn template(mut self, resource: impl Into<String>, template: impl Into<String>) -> Self {
        let template = template.into();
        self.templates
            .entry(resource.into())
            .or_default()
            .push(template.trim_matches('/').to_string());
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Selects the most specific template whose placeholders are all available.
    fn select_template(&self, resource: &Resource, available: &BTreeSet<&str>) -> Option<&str> {
        self.templates
            .get(resource.name())?
            .iter()
            .map(|template| (template, placeholders(template)))
            .filter(|(_, names)| names.iter().all(|name| available.contains(name)))
            .max_by_key(|(_, names)| names.len())
            .map(|(template, _)| template.as_str())
    }
}

impl LinkGenerator for BaseUrlLinkGenerator {
    fn create_link(
        &self,
        parent_entity: Option<&ParentEntity>,
        resource: &Resource,
        id: Option<&EntityId>,
        parameters: &Parameters,
        _server_configuration: Option<&Value>,
    ) -> String {
        let parent_id = parent_entity.and_then(ParentEntity::id);

        let mut available: BTreeSet<&str> = parameters.keys().map(String::as_str).collect();
        if id.is_some() {
            available.insert("id");
        }
        if parent_id.is_some() {
            available.insert("parent_id");
        }

        let mut consumed: BTreeSet<&str> = BTreeSet::new();
        let path = match self.select_template(resource, &available) {
            Some(template) => {
                let mut path = template.to_string();
                for name in placeholders(template) {
                    let value = match name {
                        "id" => id.map(ToString::to_string),
                        "parent_id" => parent_id.map(ToString::to_string),
                        _ => parameters.get(name).map(query_value),
                    };
                    if let Some(value) = value {
                        path = path.replace(&format!("{{{name}}}"), &urlencoding::encode(&value));
                        consumed.insert(name);
                    }
                }
                path
            }
            None => {
                let mut segments: Vec<String> = Vec::new();
                if let (Some(parent), Some(parent_id)) = (parent_entity, parent_id) {
                    segments.push(urlencoding::encode(parent.resource().name()).into_owned());
                    segments.push(urlencoding::encode(&parent_id.to_string()).into_owned());
                }
                segments.push(urlencoding::encode(resource.name()).into_owned());
                if let Some(id) = id {
                    segments.push(urlencoding::encode(&id.to_string()).into_owned());
                }
                segments.join("/")
            }
        };

        let query: Vec<String> = parameters
            .iter()
            .filter(|(name, _)| !consumed.contains(name.as_str()))
            .map(|(name, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(name),
                    urlencoding::encode(&query_value(value))
                )
            })
            .collect();

        if query.is_empty() {
            format!("{}/{path}", self.base_url)
        } else {
            format!("{}/{path}?{}", self.base_url, query.join("&"))
        }
    }
}

/// Returns the placeholder names of a template, in order of appearance.
fn placeholders(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            break;
        };
        names.push(&after[..end]);
        rest = &after[end + 1..];
    }
    names
}

/// Formats a parameter for a URL: strings verbatim, arrays comma-joined.
fn query_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items.iter().map(query_value).collect::<Vec<_>>().join(","),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
