//! Represents one object (key/value pair) in a remote bucket.

use crate::{
    codec::{
        request,
        response::{RemoteInfo, decode_info, decode_into},
        transform,
    },
    config::ObjectOptions,
    connection::{Connection, Response},
    errors::{ObjectError, ObjectResult, RemoteError},
    models::{
        attributes::{Attributes, Digest},
        metadata::Meta,
    },
};
use bytes::Bytes;
use http::StatusCode;
use std::{fmt, sync::Arc};
use tracing::{debug, warn};

/// Handle to a single object in the store.
///
/// The handle owns its attribute set and, once known, the payload. It is not
/// a cache: every lifecycle call issues exactly one request through the
/// connection.
pub struct Object<C> {
    connection: Arc<C>,

    /// Storage key, never starting with `/`.
    key: String,

    /// Payload, if set locally or fetched.
    value: Option<Bytes>,

    /// Byte length of `value`; only ever derived from it.
    size: u64,

    /// Typed attributes sent on `save` and refreshed by `head`/`fetch`.
    pub attributes: Attributes,

    /// Facts reported by the last `head`/`fetch`.
    remote: RemoteInfo,

    /// Last raw response from `head`/`fetch`.
    response: Option<Response>,

    /// Error detail from the last failed `save`.
    error: Option<RemoteError>,

    /// Set when `save` resolved an `AutoCompute` digest; a new value must
    /// then be digested again.
    digest_resolved_by_save: bool,

    /// Set when `save` left the gzip output in `value`.
    value_compressed_by_save: bool,
}

impl<C: Connection> Object<C> {
    /// Create a handle for `key`, inferring the content type from its
    /// extension and then applying `options`.
    pub fn new(
        connection: Arc<C>,
        key: impl AsRef<str>,
        value: Option<Bytes>,
        options: ObjectOptions,
    ) -> ObjectResult<Self> {
        let key = normalize_key(key.as_ref()).to_string();
        let mut attributes = Attributes::for_key(&key);
        options.apply(&mut attributes)?;

        let mut object = Self {
            connection,
            key,
            value: None,
            size: 0,
            attributes,
            remote: RemoteInfo::default(),
            response: None,
            error: None,
            digest_resolved_by_save: false,
            value_compressed_by_save: false,
        };
        if let Some(value) = value {
            object.set_value(value);
        }
        Ok(object)
    }

    /// Bare handle with no value and no overrides.
    pub fn bare(connection: Arc<C>, key: impl AsRef<str>) -> Self {
        let key = normalize_key(key.as_ref()).to_string();
        Self {
            connection,
            attributes: Attributes::for_key(&key),
            key,
            value: None,
            size: 0,
            remote: RemoteInfo::default(),
            response: None,
            error: None,
            digest_resolved_by_save: false,
            value_compressed_by_save: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Replace the key; one leading `/` is stripped.
    pub fn set_key(&mut self, key: impl AsRef<str>) {
        self.key = normalize_key(key.as_ref()).to_string();
    }

    /// Payload held in memory. Never touches the network; see
    /// [`resolve_value`](Self::resolve_value).
    pub fn value(&self) -> Option<&Bytes> {
        self.value.as_ref()
    }

    /// Set the payload and recompute `size`.
    pub fn set_value(&mut self, value: impl Into<Bytes>) {
        let value = value.into();
        self.size = value.len() as u64;
        self.value = Some(value);
        self.value_compressed_by_save = false;
        if self.digest_resolved_by_save {
            self.attributes.content_md5 = Digest::AutoCompute;
            self.digest_resolved_by_save = false;
        }
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Return the payload, fetching it from the store first if none is held.
    pub async fn resolve_value(&mut self) -> ObjectResult<Option<&Bytes>> {
        if self.value.is_none() {
            self.fetch().await?;
        }
        Ok(self.value.as_ref())
    }

    pub fn meta(&self) -> &Meta {
        &self.attributes.meta
    }

    pub fn set_meta(&mut self, key: impl AsRef<str>, value: impl ToString) {
        self.attributes.meta.set(key, value);
    }

    /// Validate and set a precomputed hex digest.
    pub fn set_content_md5(&mut self, hex: &str) -> ObjectResult<()> {
        self.attributes.content_md5 = Digest::from_hex(hex)?;
        self.digest_resolved_by_save = false;
        Ok(())
    }

    /// Ask `save` to compute the digest of the payload it sends.
    pub fn compute_content_md5(&mut self) {
        self.attributes.content_md5 = Digest::AutoCompute;
        self.digest_resolved_by_save = false;
    }

    pub fn remote(&self) -> &RemoteInfo {
        &self.remote
    }

    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    pub fn error(&self) -> Option<&RemoteError> {
        self.error.as_ref()
    }

    /// True iff a HEAD request answers 200. Nothing is recorded on the handle.
    pub async fn exists(&self) -> ObjectResult<bool> {
        let response = self.connection.head(&self.key).await?;
        debug!(key = %self.key, status = %response.status, "exists");
        Ok(response.status == StatusCode::OK)
    }

    /// Issue a HEAD request and refresh the attributes from its headers.
    pub async fn head(&mut self) -> ObjectResult<&mut Self> {
        let response = self.connection.head(&self.key).await?;
        debug!(key = %self.key, status = %response.status, "head");
        self.absorb(response);
        Ok(self)
    }

    /// Issue a GET request; like [`head`](Self::head) but also sets the
    /// payload. A gzip-encoded body is decoded here when the transport left
    /// it compressed, and `gzip` is set so a later save compresses again.
    /// Error responses never become the payload.
    pub async fn fetch(&mut self) -> ObjectResult<&mut Self> {
        let response = self.connection.get(&self.key).await?;
        debug!(
            key = %self.key,
            status = %response.status,
            bytes = response.body.len(),
            "fetch"
        );

        if !response.status.is_success() {
            self.absorb(response);
            return Ok(self);
        }

        self.set_value(decoded_body(&response)?);
        self.absorb(response);
        Ok(self)
    }

    /// Run the transform pipeline, encode the headers and PUT the payload.
    ///
    /// A handle holding no value first loads the stored payload, leaving
    /// local attribute edits in place; with nothing stored either, the save
    /// fails with [`ObjectError::MissingValue`] and nothing is written.
    ///
    /// Returns `Ok(true)` only for a 200 answer. Any other status returns
    /// `Ok(false)` with [`error`](Self::error) describing the rejection;
    /// `Err` is reserved for local validation and transport failures.
    pub async fn save(&mut self) -> ObjectResult<bool> {
        if self.value.is_none() {
            self.load_stored_value().await?;
        }
        let Some(value) = self.value.clone() else {
            return Err(ObjectError::MissingValue(self.key.clone()));
        };

        let was_auto = self.attributes.content_md5 == Digest::AutoCompute;
        let prepared =
            transform::prepare(&mut self.attributes, value, self.value_compressed_by_save)?;
        self.size = prepared.len() as u64;
        self.value = Some(prepared);
        self.value_compressed_by_save = self.attributes.gzip;
        if was_auto {
            self.digest_resolved_by_save = true;
        }

        let headers = request::encode(&self.attributes, self.size)?;
        let body = self.value.clone().unwrap_or_default();
        let response = self.connection.put(&self.key, &headers, body).await?;

        let saved = response.status == StatusCode::OK;
        self.error = if saved {
            None
        } else {
            Some(
                response
                    .error
                    .unwrap_or_else(|| RemoteError::from_status(response.status)),
            )
        };

        if saved {
            debug!(key = %self.key, size = self.size, "saved object");
        } else if let Some(error) = &self.error {
            warn!(key = %self.key, %error, "save rejected");
        }
        Ok(saved)
    }

    /// True iff the DELETE request answers 204.
    pub async fn delete(&self) -> ObjectResult<bool> {
        let response = self.connection.delete(&self.key).await?;
        debug!(key = %self.key, status = %response.status, "delete");
        Ok(response.status == StatusCode::NO_CONTENT)
    }

    /// GET the stored payload into `value` without decoding its headers.
    async fn load_stored_value(&mut self) -> ObjectResult<()> {
        let response = self.connection.get(&self.key).await?;
        debug!(key = %self.key, status = %response.status, "load before save");
        if !response.status.is_success() {
            return Ok(());
        }
        self.set_value(decoded_body(&response)?);
        if is_gzip_response(&response) {
            self.attributes.gzip = true;
        }
        Ok(())
    }

    fn absorb(&mut self, response: Response) {
        decode_into(&response.headers, &mut self.attributes);
        if is_gzip_response(&response) {
            self.attributes.gzip = true;
        }
        self.remote = decode_info(&response.headers);
        self.response = Some(response);
    }
}

fn is_gzip_response(response: &Response) -> bool {
    response
        .headers
        .get(request::CONTENT_ENCODING)
        .is_some_and(|encoding| encoding.trim().eq_ignore_ascii_case("gzip"))
}

/// Response body with one gzip layer removed when the transport left it on.
fn decoded_body(response: &Response) -> ObjectResult<Bytes> {
    if is_gzip_response(response) && transform::is_gzip(&response.body) {
        transform::gunzip(&response.body)
    } else {
        Ok(response.body.clone())
    }
}

impl<C> fmt::Display for Object<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({:?})", self.key)
    }
}

impl<C> fmt::Debug for Object<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("key", &self.key)
            .field("size", &self.size)
            .field("attributes", &self.attributes)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// Strip one leading `/` from a key.
pub fn normalize_key(key: &str) -> &str {
    key.strip_prefix('/').unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        codec::headers::{RequestHeaders, ResponseHeaders},
        connection::memory::MemoryConnection,
        models::attributes::Access,
    };
    use std::sync::Mutex;

    /// Connection answering with fixed statuses and recording the last PUT.
    #[derive(Default)]
    struct ScriptedConnection {
        put_status: Option<StatusCode>,
        put_error: Option<RemoteError>,
        last_put: Mutex<Option<(String, RequestHeaders, Bytes)>>,
    }

    impl Connection for ScriptedConnection {
        async fn head(&self, _key: &str) -> ObjectResult<Response> {
            Ok(Response::new(StatusCode::NOT_FOUND))
        }

        async fn get(&self, _key: &str) -> ObjectResult<Response> {
            let headers: ResponseHeaders = [("X_AMZ_META_COLOR", "blue")].into_iter().collect();
            Ok(Response::new(StatusCode::OK)
                .with_headers(headers)
                .with_body("remote"))
        }

        async fn put(
            &self,
            key: &str,
            headers: &RequestHeaders,
            body: Bytes,
        ) -> ObjectResult<Response> {
            *self.last_put.lock().unwrap() = Some((key.to_string(), headers.clone(), body));
            let mut response = Response::new(self.put_status.unwrap_or(StatusCode::OK));
            response.error = self.put_error.clone();
            Ok(response)
        }

        async fn delete(&self, _key: &str) -> ObjectResult<Response> {
            Ok(Response::new(StatusCode::NOT_FOUND))
        }
    }

    fn object(conn: ScriptedConnection, key: &str, value: &'static str) -> Object<ScriptedConnection> {
        Object::new(
            Arc::new(conn),
            key,
            Some(Bytes::from_static(value.as_bytes())),
            ObjectOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn construction_normalizes_key_and_infers_type() {
        let obj = object(ScriptedConnection::default(), "/test.txt", "heyo");
        assert_eq!(obj.key(), "test.txt");
        assert_eq!(obj.size(), 4);
        assert_eq!(obj.attributes.content_type.as_deref(), Some("text/plain"));
        assert_eq!(obj.to_string(), "Object(\"test.txt\")");
    }

    #[test]
    fn set_key_strips_a_single_separator() {
        let mut obj = Object::bare(Arc::new(ScriptedConnection::default()), "a");
        obj.set_key("//nested/key");
        assert_eq!(obj.key(), "/nested/key");
        obj.set_key("nested/key");
        assert_eq!(obj.key(), "nested/key");
    }

    #[tokio::test]
    async fn save_sends_encoded_headers_and_payload() {
        let conn = Arc::new(ScriptedConnection::default());
        let mut obj = Object::new(
            conn.clone(),
            "/test.txt",
            Some(Bytes::from_static(b"heyo")),
            ObjectOptions::default(),
        )
        .unwrap();
        obj.compute_content_md5();
        obj.attributes.access = Some(Access::PublicRead);

        assert!(obj.save().await.unwrap());
        assert!(obj.error().is_none());
        assert_eq!(
            obj.attributes.content_md5,
            Digest::Precomputed("30e5a336059982c76b6c214d3634c038".into())
        );

        let (key, headers, body) = conn.last_put.lock().unwrap().clone().unwrap();
        assert_eq!(key, "test.txt");
        assert_eq!(body, Bytes::from_static(b"heyo"));
        assert_eq!(headers.get("Content-MD5"), Some("MOWjNgWZgsdrbCFNNjTAOA=="));
        assert_eq!(headers.get("Content-Length"), Some("4"));
        assert_eq!(headers.get("x-amz-acl"), Some("public-read"));
    }

    #[tokio::test]
    async fn non_ok_save_returns_false_and_records_error() {
        let conn = ScriptedConnection {
            put_status: Some(StatusCode::FORBIDDEN),
            ..ScriptedConnection::default()
        };
        let mut obj = object(conn, "test.txt", "heyo");

        assert!(!obj.save().await.unwrap());
        let error = obj.error().unwrap();
        assert_eq!(error.status, StatusCode::FORBIDDEN);
        assert_eq!(error.code, "Forbidden");
    }

    #[tokio::test]
    async fn created_is_not_success() {
        let conn = ScriptedConnection {
            put_status: Some(StatusCode::CREATED),
            ..ScriptedConnection::default()
        };
        let mut obj = object(conn, "test.txt", "heyo");
        assert!(!obj.save().await.unwrap());
        assert!(obj.error().is_some());
    }

    #[tokio::test]
    async fn transport_error_detail_is_kept() {
        let conn = ScriptedConnection {
            put_status: Some(StatusCode::BAD_REQUEST),
            put_error: Some(RemoteError::new(
                StatusCode::BAD_REQUEST,
                "BadDigest",
                "mismatch",
            )),
            ..ScriptedConnection::default()
        };
        let mut obj = object(conn, "test.txt", "heyo");
        assert!(!obj.save().await.unwrap());
        assert_eq!(obj.error().unwrap().code, "BadDigest");
    }

    #[tokio::test]
    async fn malformed_digest_fails_before_any_request() {
        let conn = Arc::new(ScriptedConnection::default());
        let mut obj = Object::bare(conn.clone(), "test.txt");
        obj.set_value("heyo");
        obj.attributes.content_md5 = Digest::Precomputed("123".into());

        assert!(obj.save().await.is_err());
        assert!(conn.last_put.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn new_value_after_save_is_digested_again() {
        let conn = Arc::new(ScriptedConnection::default());
        let mut obj = Object::bare(conn.clone(), "test.txt");
        obj.set_value("heyo");
        obj.compute_content_md5();
        assert!(obj.save().await.unwrap());

        obj.set_value("testing 1234...");
        assert_eq!(obj.attributes.content_md5, Digest::AutoCompute);
        assert!(obj.save().await.unwrap());
        assert_eq!(
            obj.attributes.content_md5.as_hex(),
            Some("7ffd427f58f0b77a7236bde183a98551")
        );
    }

    #[tokio::test]
    async fn second_save_with_same_value_keeps_digest() {
        let conn = Arc::new(ScriptedConnection::default());
        let mut obj = Object::bare(conn, "test.txt");
        obj.set_value("heyo");
        obj.compute_content_md5();
        assert!(obj.save().await.unwrap());
        let first = obj.attributes.content_md5.clone();
        assert!(obj.save().await.unwrap());
        assert_eq!(obj.attributes.content_md5, first);
    }

    #[tokio::test]
    async fn resolve_value_fetches_lazily() {
        let mut obj = Object::bare(Arc::new(ScriptedConnection::default()), "remote.txt");
        assert!(obj.value().is_none());

        let value = obj.resolve_value().await.unwrap().cloned();
        assert_eq!(value, Some(Bytes::from_static(b"remote")));
        assert_eq!(obj.size(), 6);
        assert_eq!(obj.meta().get("color"), Some("blue"));
        assert!(obj.response().is_some());
    }

    #[tokio::test]
    async fn resolve_value_skips_fetch_when_held() {
        let mut obj = object(ScriptedConnection::default(), "test.txt", "local");
        let value = obj.resolve_value().await.unwrap().cloned();
        assert_eq!(value, Some(Bytes::from_static(b"local")));
        assert!(obj.response().is_none());
    }

    #[tokio::test]
    async fn exists_and_delete_follow_status_contract() {
        let obj = Object::bare(Arc::new(ScriptedConnection::default()), "gone.txt");
        assert!(!obj.exists().await.unwrap());
        assert!(!obj.delete().await.unwrap());
    }

    #[tokio::test]
    async fn save_after_head_keeps_stored_payload() {
        let conn = Arc::new(MemoryConnection::new());
        let mut writer = Object::bare(conn.clone(), "doc.txt");
        writer.set_value("important payload");
        assert!(writer.save().await.unwrap());

        let mut editor = Object::bare(conn.clone(), "doc.txt");
        editor.head().await.unwrap();
        editor.set_meta("reviewed", "yes");
        assert!(editor.save().await.unwrap());

        assert_eq!(
            conn.stored_body("doc.txt").await,
            Some(Bytes::from_static(b"important payload"))
        );
        let mut reader = Object::bare(conn, "doc.txt");
        reader.head().await.unwrap();
        assert_eq!(reader.meta().get("reviewed"), Some("yes"));
    }

    #[tokio::test]
    async fn save_without_any_value_writes_nothing() {
        let conn = Arc::new(MemoryConnection::new());
        let mut obj = Object::bare(conn.clone(), "nothing.txt");
        obj.set_meta("owner", "ops");

        assert!(matches!(
            obj.save().await,
            Err(ObjectError::MissingValue(key)) if key == "nothing.txt"
        ));
        assert!(conn.is_empty().await);
    }

    #[tokio::test]
    async fn head_without_meta_yields_empty_meta() {
        let conn = Arc::new(MemoryConnection::new());
        let mut writer = Object::bare(conn.clone(), "plain.txt");
        writer.set_value("heyo");
        assert!(writer.save().await.unwrap());

        let mut reader = Object::bare(conn, "plain.txt");
        reader.set_meta("leftover", "x");
        reader.head().await.unwrap();
        assert!(reader.meta().is_empty());
        assert!(reader.value().is_none());
        assert_eq!(reader.remote().content_length, Some(4));
    }
}
