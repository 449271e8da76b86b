//! Case-insensitive header map.

use std::collections::BTreeMap;

/// A case-insensitive mapping of header names to values.
///
/// Lookups ignore case. The spelling used when a header is first inserted is
/// kept, so request headers reach the transport exactly as the caller wrote
/// them. Response headers are stored with lower-cased names (see
/// [`Headers::lowercased`]).
///
/// # Example
///
/// ```rust
/// use rest_resources::Headers;
///
/// let mut headers = Headers::new();
/// headers.insert("Content-Type", "application/json");
///
/// assert_eq!(headers.get("content-type"), Some("application/json"));
/// assert_eq!(headers.iter().next(), Some(("Content-Type", "application/json")));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers {
    /// Keyed by lower-cased name; the value holds the original spelling.
    entries: BTreeMap<String, (String, String)>,
}

impl Headers {
    /// Creates an empty header map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Inserts a header, replacing the value of an existing header with the
    /// same name (ignoring case). The first spelling of the name is kept.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        self.entries
            .entry(name.to_ascii_lowercase())
            .and_modify(|entry| entry.1.clone_from(&value))
            .or_insert((name, value));
    }

    /// Returns the value of the named header, ignoring case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` if the named header is present, ignoring case.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    /// Removes the named header, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries
            .remove(&name.to_ascii_lowercase())
            .map(|(_, value)| value)
    }

    /// Merges `other` over `self`; headers in `other` win.
    #[must_use]
    pub fn merged_with(mut self, other: &Self) -> Self {
        for (name, value) in other.iter() {
            self.insert(name, value);
        }
        self
    }

    /// Returns a copy whose header names are all lower-case.
    #[must_use]
    pub fn lowercased(&self) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|(key, (_, value))| (key.clone(), (key.clone(), value.clone())))
            .collect();
        Self { entries }
    }

    /// Iterates over `(name, value)` pairs in lower-cased name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Returns the number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}
