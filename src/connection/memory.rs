//! In-process object store speaking the same status and header contract as
//! an S3 endpoint. Used by tests and for exercising objects without a
//! network.

use crate::{
    codec::{
        headers::{RequestHeaders, ResponseHeaders},
        request::{CONTENT_LENGTH, CONTENT_MD5},
        transform::md5_hex,
    },
    connection::{Connection, Response},
    errors::{ObjectResult, RemoteError},
};
use ::http::StatusCode;
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

/// How response header names are spelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeaderStyle {
    /// Lower-case, hyphen separated (`x-amz-meta-a`).
    #[default]
    Canonical,
    /// Upper-case, underscore separated (`X_AMZ_META_A`), as CGI-style
    /// environments report them.
    UpperSnake,
}

impl HeaderStyle {
    fn render(&self, name: &str) -> String {
        match self {
            HeaderStyle::Canonical => name.to_ascii_lowercase(),
            HeaderStyle::UpperSnake => name.to_ascii_uppercase().replace('-', "_"),
        }
    }
}

#[derive(Debug, Clone)]
struct StoredObject {
    headers: Vec<(String, String)>,
    body: Bytes,
    etag: String,
    last_modified: DateTime<Utc>,
}

/// Store kept in memory behind an async lock.
#[derive(Debug, Default)]
pub struct MemoryConnection {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    style: HeaderStyle,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(style: HeaderStyle) -> Self {
        Self {
            objects: RwLock::default(),
            style,
        }
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Raw stored bytes for `key`, bypassing the response path.
    pub async fn stored_body(&self, key: &str) -> Option<Bytes> {
        self.objects.read().await.get(key).map(|obj| obj.body.clone())
    }

    fn response_headers(&self, stored: &StoredObject) -> ResponseHeaders {
        let mut headers = ResponseHeaders::new();
        for (name, value) in &stored.headers {
            headers.append(self.style.render(name), value.clone());
        }
        headers.append(self.style.render("ETag"), format!("\"{}\"", stored.etag));
        headers.append(
            self.style.render("Last-Modified"),
            stored
                .last_modified
                .format("%a, %d %b %Y %H:%M:%S GMT")
                .to_string(),
        );
        headers
    }
}

/// Check the request integrity headers against the body, S3 style.
fn validate_put(headers: &RequestHeaders, body: &[u8]) -> Result<(), RemoteError> {
    if let Some(length) = headers.get(CONTENT_LENGTH) {
        if length.trim().parse::<usize>().ok() != Some(body.len()) {
            return Err(RemoteError::new(
                StatusCode::BAD_REQUEST,
                "IncompleteBody",
                "You did not provide the number of bytes specified by the Content-Length HTTP header.",
            ));
        }
    }

    let Some(md5_header) = headers.get(CONTENT_MD5) else {
        return Ok(());
    };
    let decoded = general_purpose::STANDARD
        .decode(md5_header.trim())
        .ok()
        .filter(|raw| raw.len() == 16)
        .ok_or_else(|| {
            RemoteError::new(
                StatusCode::BAD_REQUEST,
                "InvalidDigest",
                "The Content-MD5 you specified was invalid.",
            )
        })?;
    if hex::encode(decoded) != md5_hex(body) {
        return Err(RemoteError::new(
            StatusCode::BAD_REQUEST,
            "BadDigest",
            "The Content-MD5 you specified did not match what we received.",
        ));
    }
    Ok(())
}

impl Connection for MemoryConnection {
    async fn head(&self, key: &str) -> ObjectResult<Response> {
        let objects = self.objects.read().await;
        let response = match objects.get(key) {
            Some(stored) => Response::new(StatusCode::OK).with_headers(self.response_headers(stored)),
            None => Response::new(StatusCode::NOT_FOUND),
        };
        debug!(key, status = %response.status, "memory head");
        Ok(response)
    }

    async fn get(&self, key: &str) -> ObjectResult<Response> {
        let objects = self.objects.read().await;
        let response = match objects.get(key) {
            Some(stored) => Response::new(StatusCode::OK)
                .with_headers(self.response_headers(stored))
                .with_body(stored.body.clone()),
            None => Response::new(StatusCode::NOT_FOUND),
        };
        debug!(key, status = %response.status, "memory get");
        Ok(response)
    }

    async fn put(&self, key: &str, headers: &RequestHeaders, body: Bytes) -> ObjectResult<Response> {
        if let Err(error) = validate_put(headers, &body) {
            debug!(key, code = %error.code, "memory put rejected");
            return Ok(Response::new(error.status).with_error(error));
        }

        let stored = StoredObject {
            headers: headers
                .iter()
                .filter(|(name, _)| !name.eq_ignore_ascii_case(CONTENT_MD5))
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            etag: md5_hex(&body),
            body,
            last_modified: Utc::now(),
        };
        let etag = stored.etag.clone();
        self.objects.write().await.insert(key.to_string(), stored);
        debug!(key, %etag, "memory put stored");

        let mut response_headers = ResponseHeaders::new();
        response_headers.append(self.style.render("ETag"), format!("\"{}\"", etag));
        Ok(Response::new(StatusCode::OK).with_headers(response_headers))
    }

    /// Deleting a missing key still answers 204, as S3 does.
    async fn delete(&self, key: &str) -> ObjectResult<Response> {
        let removed = self.objects.write().await.remove(key).is_some();
        debug!(key, removed, "memory delete");
        Ok(Response::new(StatusCode::NO_CONTENT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::request::content_md5_header;

    fn put_headers(body: &[u8]) -> RequestHeaders {
        let mut headers = RequestHeaders::new();
        headers.insert("Content-Length", body.len().to_string());
        headers.insert("Content-Type", "text/plain");
        headers.insert("x-amz-meta-Owner", "ops");
        headers
    }

    #[tokio::test]
    async fn put_then_head_reports_stored_headers() {
        let conn = MemoryConnection::new();
        let put = conn
            .put("test.txt", &put_headers(b"heyo"), Bytes::from_static(b"heyo"))
            .await
            .unwrap();
        assert_eq!(put.status, StatusCode::OK);
        assert!(put.error.is_none());

        let head = conn.head("test.txt").await.unwrap();
        assert_eq!(head.status, StatusCode::OK);
        assert_eq!(head.headers.get("content-type"), Some("text/plain"));
        assert_eq!(head.headers.get("x-amz-meta-owner"), Some("ops"));
        assert_eq!(
            head.headers.get("etag"),
            Some("\"30e5a336059982c76b6c214d3634c038\"")
        );
        assert!(head.body.is_empty());
    }

    #[tokio::test]
    async fn upper_snake_style_rewrites_names() {
        let conn = MemoryConnection::with_style(HeaderStyle::UpperSnake);
        conn.put("k", &put_headers(b"v"), Bytes::from_static(b"v"))
            .await
            .unwrap();

        let got = conn.get("k").await.unwrap();
        let names: Vec<&str> = got.headers.iter().map(|(name, _)| name).collect();
        assert!(names.contains(&"X_AMZ_META_OWNER"));
        assert!(names.contains(&"CONTENT_LENGTH"));
        assert_eq!(got.body, Bytes::from_static(b"v"));
    }

    #[tokio::test]
    async fn missing_keys_are_not_found_but_delete_is_no_content() {
        let conn = MemoryConnection::new();
        assert_eq!(conn.head("nope").await.unwrap().status, StatusCode::NOT_FOUND);
        assert_eq!(conn.get("nope").await.unwrap().status, StatusCode::NOT_FOUND);
        assert_eq!(
            conn.delete("nope").await.unwrap().status,
            StatusCode::NO_CONTENT
        );
    }

    #[tokio::test]
    async fn rejects_mismatched_digest() {
        let conn = MemoryConnection::new();
        let mut headers = put_headers(b"heyo");
        headers.insert(
            "Content-MD5",
            content_md5_header("d41d8cd98f00b204e9800998ecf8427e").unwrap(),
        );

        let response = conn
            .put("test.txt", &headers, Bytes::from_static(b"heyo"))
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error.unwrap().code, "BadDigest");
        assert!(conn.is_empty().await);
    }

    #[tokio::test]
    async fn rejects_wrong_content_length() {
        let conn = MemoryConnection::new();
        let response = conn
            .put("test.txt", &put_headers(b"longer"), Bytes::from_static(b"heyo"))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, "IncompleteBody");
    }

    #[tokio::test]
    async fn accepts_matching_digest() {
        let conn = MemoryConnection::new();
        let mut headers = put_headers(b"heyo");
        headers.insert("Content-MD5", "MOWjNgWZgsdrbCFNNjTAOA==");
        let response = conn
            .put("test.txt", &headers, Bytes::from_static(b"heyo"))
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(conn.len().await, 1);
    }
}
