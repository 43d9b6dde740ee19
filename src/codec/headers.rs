//! Header containers for the write and read paths.
//!
//! Outbound headers keep insertion order so the encoder output is
//! reproducible. Inbound headers keep the names exactly as the transport
//! delivered them; lookups go through [`normalize_header_name`] so that
//! `Content-Type`, `content-type` and `CONTENT_TYPE` all resolve alike.

use crate::errors::{ObjectError, ObjectResult};

/// Canonical comparison form of a header name: ASCII lower-case with `_`
/// folded to `-`.
pub fn normalize_header_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '_' => '-',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// Ordered header list sent with a write request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    entries: Vec<(String, String)>,
}

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`, replacing any entry whose name matches
    /// case-insensitively. The first insertion position is kept.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(entry) => *entry = (name, value),
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reject names or values that cannot travel in an HTTP/1.1 header.
    pub fn validate(&self) -> ObjectResult<()> {
        for (name, value) in &self.entries {
            http::HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
                ObjectError::InvalidHeader {
                    name: name.clone(),
                    reason: err.to_string(),
                }
            })?;
            http::HeaderValue::from_str(value).map_err(|err| ObjectError::InvalidHeader {
                name: name.clone(),
                reason: err.to_string(),
            })?;
        }
        Ok(())
    }
}

/// Headers received with a response. A name may carry several values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    entries: Vec<(String, Vec<String>)>,
}

impl ResponseHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value. Values for the same raw name accumulate in order.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    /// First value of the first header matching `name` after normalization.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).next()
    }

    pub fn get_all<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        let wanted = normalize_header_name(name);
        self.entries
            .iter()
            .filter(move |(existing, _)| normalize_header_name(existing) == wanted)
            .flat_map(|(_, values)| values.iter().map(String::as_str))
    }

    /// Raw names with their values, in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ResponseHeaders
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}

impl From<&http::HeaderMap> for ResponseHeaders {
    fn from(map: &http::HeaderMap) -> Self {
        map.iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_separators() {
        assert_eq!(normalize_header_name("X_AMZ_META_Test"), "x-amz-meta-test");
        assert_eq!(normalize_header_name("Content-Type"), "content-type");
    }

    #[test]
    fn request_insert_replaces_case_insensitively() {
        let mut headers = RequestHeaders::new();
        headers.insert("Content-Type", "text/plain");
        headers.insert("Content-Length", "4");
        headers.insert("content-type", "text/html");

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/html"));
        let names: Vec<&str> = headers.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["content-type", "Content-Length"]);
    }

    #[test]
    fn request_validate_rejects_control_characters() {
        let mut headers = RequestHeaders::new();
        headers.insert("x-amz-meta-note", "line\nbreak");
        assert!(matches!(
            headers.validate(),
            Err(ObjectError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn response_lookup_tolerates_transport_naming() {
        let headers: ResponseHeaders = [
            ("CONTENT_TYPE", "text/plain"),
            ("X_AMZ_META_A", "first"),
            ("X_AMZ_META_A", "second"),
        ]
        .into_iter()
        .collect();

        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(headers.get("x-amz-meta-a"), Some("first"));
        assert_eq!(headers.get_all("x-amz-meta-a").count(), 2);
        assert_eq!(headers.len(), 2);
        assert!(headers.get("etag").is_none());
    }

    #[test]
    fn converts_from_http_header_map() {
        let mut map = http::HeaderMap::new();
        map.insert("x-amz-meta-z", http::HeaderValue::from_static("z"));
        map.append("x-amz-meta-z", http::HeaderValue::from_static("zz"));

        let headers = ResponseHeaders::from(&map);
        let values: Vec<&str> = headers.get_all("X-Amz-Meta-Z").collect();
        assert_eq!(values, vec!["z", "zz"]);
    }
}
