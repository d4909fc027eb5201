//! Ordered key/value containers for headers, query strings and form bodies.
//!
//! # Design
//! `HttpParameters` is a plain `Vec` of pairs rather than a map: insertion
//! order is kept, duplicate keys are allowed, and lookups return the first
//! match in iteration order. How two keys compare is decided by the key type
//! through `ParameterKey`, so header names can match case-insensitively while
//! query keys match exactly.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A typed parameter key.
pub trait ParameterKey: Clone + fmt::Debug {
    /// The key as it is written on the wire.
    fn as_str(&self) -> &str;

    /// Whether this key refers to `name`.
    fn matches(&self, name: &str) -> bool {
        self.as_str() == name
    }
}

impl ParameterKey for String {
    fn as_str(&self) -> &str {
        self
    }
}

/// An HTTP header name. Comparisons ignore ASCII case.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderName(String);

impl HeaderName {
    pub const ACCEPT: &'static str = "accept";
    pub const CONTENT_TYPE: &'static str = "content-type";
    pub const USER_AGENT: &'static str = "user-agent";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl ParameterKey for HeaderName {
    fn as_str(&self) -> &str {
        &self.0
    }

    fn matches(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name)
    }
}

impl PartialEq for HeaderName {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl Eq for HeaderName {}

impl Hash for HeaderName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.0.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl fmt::Display for HeaderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HeaderName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for HeaderName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// An ordered list of `(key, value)` pairs with first-match-wins lookup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HttpParameters<K> {
    entries: Vec<(K, String)>,
}

/// Request and response headers.
pub type HttpHeaders = HttpParameters<HeaderName>;

/// Query string or form parameters.
pub type QueryParameters = HttpParameters<String>;

impl<K> Default for HttpParameters<K> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<K: ParameterKey> HttpParameters<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of `append`.
    pub fn with(mut self, key: impl Into<K>, value: impl Into<String>) -> Self {
        self.append(key, value);
        self
    }

    /// Add a pair at the end, keeping any existing pairs with the same key.
    pub fn append(&mut self, key: impl Into<K>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Replace every pair for `key` with a single one.
    ///
    /// The surviving pair keeps the position of the first match; a new key is
    /// appended.
    pub fn set(&mut self, key: impl Into<K>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.position(key.as_str()) {
            Some(index) => {
                let name = key.as_str().to_string();
                self.entries[index] = (key, value);
                let mut seen = 0usize;
                self.entries.retain(|(k, _)| {
                    if !k.matches(&name) {
                        return true;
                    }
                    seen += 1;
                    seen == 1
                });
            }
            None => self.entries.push((key, value)),
        }
    }

    /// Append the pair only when no pair for `key` exists yet.
    ///
    /// Returns whether the pair was added.
    pub fn set_if_absent(&mut self, key: impl Into<K>, value: impl Into<String>) -> bool {
        let key = key.into();
        if self.contains(key.as_str()) {
            return false;
        }
        self.entries.push((key, value.into()));
        true
    }

    /// Copy in every pair from `other` whose key is not present in `self`.
    ///
    /// Presence is checked against `self` as it was before the merge, so
    /// duplicate keys inside `other` are all carried over.
    pub fn merge_missing(&mut self, other: &HttpParameters<K>) {
        let missing: Vec<(K, String)> = other
            .entries
            .iter()
            .filter(|(k, _)| !self.contains(k.as_str()))
            .cloned()
            .collect();
        self.entries.extend(missing);
    }

    /// The first value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.matches(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k.matches(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Remove every pair for `name`, returning how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| !k.matches(name));
        before - self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &str)> {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode as `application/x-www-form-urlencoded`.
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in &self.entries {
            serializer.append_pair(k.as_str(), v);
        }
        serializer.finish()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k.matches(name))
    }
}

impl<K, K2, V> FromIterator<(K2, V)> for HttpParameters<K>
where
    K: ParameterKey,
    K2: Into<K>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K2, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        params.extend(iter);
        params
    }
}

impl<K, K2, V> Extend<(K2, V)> for HttpParameters<K>
where
    K: ParameterKey,
    K2: Into<K>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K2, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.append(k, v);
        }
    }
}

impl<K> IntoIterator for HttpParameters<K> {
    type Item = (K, String);
    type IntoIter = std::vec::IntoIter<(K, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
