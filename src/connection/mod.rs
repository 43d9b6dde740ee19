//! The remote store collaborator.
//!
//! An [`Object`](crate::models::object::Object) never speaks HTTP itself; it
//! hands keys, headers and bodies to a [`Connection`] and reads back a
//! [`Response`]. Signing, pooling and retries all live behind this trait.

pub mod http;
pub mod memory;

use crate::{
    codec::headers::{RequestHeaders, ResponseHeaders},
    errors::{ObjectResult, RemoteError},
};
use ::http::StatusCode;
use bytes::Bytes;
use std::future::Future;

/// Outcome of one request against the store.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: ResponseHeaders,
    pub body: Bytes,
    /// Error detail for a rejected write.
    pub error: Option<RemoteError>,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: ResponseHeaders::new(),
            body: Bytes::new(),
            error: None,
        }
    }

    pub fn with_headers(mut self, headers: ResponseHeaders) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_error(mut self, error: RemoteError) -> Self {
        self.error = Some(error);
        self
    }
}

/// Minimal object-store surface consumed by the object handle.
///
/// Transport failures are returned as `Err`; any HTTP status, success or
/// not, is an `Ok(Response)`.
pub trait Connection: Send + Sync {
    fn head(&self, key: &str) -> impl Future<Output = ObjectResult<Response>> + Send;

    fn get(&self, key: &str) -> impl Future<Output = ObjectResult<Response>> + Send;

    fn put(
        &self,
        key: &str,
        headers: &RequestHeaders,
        body: Bytes,
    ) -> impl Future<Output = ObjectResult<Response>> + Send;

    fn delete(&self, key: &str) -> impl Future<Output = ObjectResult<Response>> + Send;
}
