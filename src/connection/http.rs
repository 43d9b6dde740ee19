//! Path-style HTTP collaborator: `{endpoint}/{bucket}/{key}`.
//!
//! Requests go out unsigned, which suits local S3-compatible stores and
//! proxies that sign on the caller's behalf. Response bodies are handed back
//! exactly as received; no content decoding happens here.

use crate::{
    codec::headers::{RequestHeaders, ResponseHeaders},
    connection::{Connection, Response},
    errors::{ObjectError, ObjectResult, RemoteError},
};
use bytes::Bytes;
use reqwest::{Client, Url};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct HttpConnection {
    client: Client,
    endpoint: Url,
    bucket: String,
}

impl HttpConnection {
    /// Connect to `endpoint` (e.g. `http://127.0.0.1:3000`) for `bucket`.
    pub fn new(endpoint: &str, bucket: impl Into<String>) -> ObjectResult<Self> {
        let client = Client::builder().build()?;
        Self::with_client(client, endpoint, bucket)
    }

    /// Reuse an existing client, e.g. one with custom timeouts.
    pub fn with_client(
        client: Client,
        endpoint: &str,
        bucket: impl Into<String>,
    ) -> ObjectResult<Self> {
        let endpoint =
            Url::parse(endpoint).map_err(|_| ObjectError::InvalidEndpoint(endpoint.to_string()))?;
        if endpoint.cannot_be_a_base() {
            return Err(ObjectError::InvalidEndpoint(endpoint.to_string()));
        }
        Ok(Self {
            client,
            endpoint,
            bucket: bucket.into(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object URL with every key segment percent-encoded.
    pub fn object_url(&self, key: &str) -> ObjectResult<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| ObjectError::InvalidEndpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .push(&self.bucket)
            .extend(key.split('/'));
        Ok(url)
    }

    async fn read_response(response: reqwest::Response, read_body: bool) -> ObjectResult<Response> {
        let status = response.status();
        let headers = ResponseHeaders::from(response.headers());
        let body = if read_body {
            response.bytes().await?
        } else {
            Bytes::new()
        };
        Ok(Response::new(status).with_headers(headers).with_body(body))
    }
}

impl Connection for HttpConnection {
    async fn head(&self, key: &str) -> ObjectResult<Response> {
        let url = self.object_url(key)?;
        let response = self.client.head(url).send().await?;
        debug!(key, status = %response.status(), "HEAD");
        Self::read_response(response, false).await
    }

    async fn get(&self, key: &str) -> ObjectResult<Response> {
        let url = self.object_url(key)?;
        let response = self.client.get(url).send().await?;
        debug!(key, status = %response.status(), "GET");
        Self::read_response(response, true).await
    }

    async fn put(&self, key: &str, headers: &RequestHeaders, body: Bytes) -> ObjectResult<Response> {
        let url = self.object_url(key)?;
        let mut request = self.client.put(url).body(body);
        for (name, value) in headers.iter() {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(key, %status, "PUT");

        let mut out = Self::read_response(response, true).await?;
        if !status.is_success() {
            let text = String::from_utf8_lossy(&out.body);
            out.error = Some(RemoteError::from_body(status, &text));
        }
        Ok(out)
    }

    async fn delete(&self, key: &str) -> ObjectResult<Response> {
        let url = self.object_url(key)?;
        let response = self.client.delete(url).send().await?;
        debug!(key, status = %response.status(), "DELETE");
        Self::read_response(response, false).await
    }
}
