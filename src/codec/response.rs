//! Response decoder: rebuilds attributes from response headers.
//!
//! Transports disagree on header naming (`x-amz-meta-a`, `X-Amz-Meta-A`,
//! `X_AMZ_META_A`), so every name is compared in its normalized form: ASCII
//! lower-case with `_` folded to `-`.

use crate::{
    codec::{
        headers::{ResponseHeaders, normalize_header_name},
        request::{
            CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE,
            EXPIRES, PRAGMA, SERVER_SIDE_ENCRYPTION, STORAGE_CLASS,
        },
    },
    models::{
        attributes::Attributes,
        metadata::{META_PREFIX, Meta},
    },
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

/// Read-only facts the store reports about an object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemoteInfo {
    pub etag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub content_length: Option<u64>,
}

/// Collect `x-amz-meta-*` headers into a [`Meta`].
///
/// Matching names are visited in lexicographic order of their normalized
/// form; the key is whatever follows the prefix, lower-cased. A header with
/// several values contributes its first.
///
/// Separators inside the key are kept as received, so a key written as
/// `build-id` reads back as `build_id` from a transport that rewrites `-` to
/// `_` in header names. Keys without inner separators round-trip through
/// any transport.
pub fn decode_meta(headers: &ResponseHeaders) -> Meta {
    let mut matches: Vec<(String, &str, &str)> = headers
        .iter()
        .filter_map(|(name, values)| {
            let normalized = normalize_header_name(name);
            if !normalized.starts_with(META_PREFIX) {
                return None;
            }
            let first = values.first()?;
            Some((normalized, name, first.as_str()))
        })
        .collect();
    matches.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    let mut meta = Meta::new();
    for (_, raw_name, value) in matches {
        // prefix is ASCII, so the byte offset is a char boundary
        let key = &raw_name[META_PREFIX.len()..];
        if meta.get(key).is_none() {
            meta.set(key, value);
        }
    }
    meta
}

/// Apply a response's headers to `attributes`.
///
/// `meta` is replaced by the decoded mapping (empty when the response has
/// none). Other attributes are only overwritten when the response carries
/// them; unparseable values are skipped.
pub fn decode_into(headers: &ResponseHeaders, attributes: &mut Attributes) {
    attributes.meta = decode_meta(headers);

    let text_fields: [(&str, &mut Option<String>); 7] = [
        (CONTENT_TYPE, &mut attributes.content_type),
        (CONTENT_ENCODING, &mut attributes.content_encoding),
        (CONTENT_DISPOSITION, &mut attributes.content_disposition),
        (CACHE_CONTROL, &mut attributes.cache_control),
        (EXPIRES, &mut attributes.expires),
        (PRAGMA, &mut attributes.pragma),
        (SERVER_SIDE_ENCRYPTION, &mut attributes.sse),
    ];
    for (name, field) in text_fields {
        if let Some(value) = headers.get(name) {
            *field = Some(value.to_string());
        }
    }

    if let Some(raw) = headers.get(STORAGE_CLASS) {
        match raw.parse() {
            Ok(class) => attributes.storage_class = Some(class),
            Err(err) => debug!(%err, "ignoring storage class from response"),
        }
    }
}

pub fn decode_info(headers: &ResponseHeaders) -> RemoteInfo {
    RemoteInfo {
        etag: headers
            .get("ETag")
            .map(|etag| etag.trim().trim_matches('"').to_string()),
        last_modified: headers.get("Last-Modified").and_then(parse_http_date),
        content_length: headers
            .get(CONTENT_LENGTH)
            .and_then(|len| len.trim().parse().ok()),
    }
}

/// Parse an RFC 2822 / IMF-fixdate timestamp.
fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc2822(value)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            DateTime::parse_from_str(
                &value.replace("GMT", "+0000"),
                "%a, %d %b %Y %H:%M:%S %z",
            )
            .map(|dt| dt.with_timezone(&Utc))
        })
        .ok()
}
