//! User-defined metadata sent as `x-amz-meta-*` headers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Header prefix carrying user metadata.
pub const META_PREFIX: &str = "x-amz-meta-";

/// Key/value metadata attached to an object.
///
/// Keys travel in header names, which are case-insensitive on the wire, so
/// they are stored lower-cased; values keep the author's casing. Iteration is
/// ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct Meta(BTreeMap<String, String>);

impl Meta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning the previous value for the key.
    pub fn set(&mut self, key: impl AsRef<str>, value: impl ToString) -> Option<String> {
        self.0
            .insert(key.as_ref().to_ascii_lowercase(), value.to_string())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(&key.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(&key.to_ascii_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy every entry of `other` into `self`, `other` winning on conflicts.
    pub fn extend(&mut self, other: &Meta) {
        for (key, value) in other.iter() {
            self.set(key, value);
        }
    }

    /// Header name for a metadata key.
    pub fn header_name(key: &str) -> String {
        format!("{}{}", META_PREFIX, key)
    }
}

impl<K: AsRef<str>, V: ToString> FromIterator<(K, V)> for Meta {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut meta = Meta::new();
        for (key, value) in iter {
            meta.set(key, value);
        }
        meta
    }
}

impl From<BTreeMap<String, String>> for Meta {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl From<Meta> for BTreeMap<String, String> {
    fn from(meta: Meta) -> Self {
        meta.0
    }
}
