//! A bucket: a connection plus the default options its objects start with.

use crate::{
    config::ObjectOptions,
    connection::Connection,
    errors::ObjectResult,
    models::object::{Object, normalize_key},
};
use bytes::Bytes;
use std::sync::Arc;

/// Entry point for object handles sharing one connection.
///
/// Defaults are merged with per-call options here, before an object is
/// built, so objects never reach back into the bucket.
pub struct Bucket<C> {
    connection: Arc<C>,
    defaults: ObjectOptions,
}

impl<C: Connection> Bucket<C> {
    pub fn new(connection: C, defaults: ObjectOptions) -> Self {
        Self::from_arc(Arc::new(connection), defaults)
    }

    pub fn from_arc(connection: Arc<C>, defaults: ObjectOptions) -> Self {
        Self {
            connection,
            defaults,
        }
    }

    pub fn connection(&self) -> &Arc<C> {
        &self.connection
    }

    pub fn defaults(&self) -> &ObjectOptions {
        &self.defaults
    }

    /// Handle for `key` with only the bucket defaults applied.
    pub fn object(&self, key: &str) -> ObjectResult<Object<C>> {
        self.object_with(key, None, ObjectOptions::default())
    }

    /// Handle for `key` with `options` merged over the bucket defaults.
    pub fn object_with(
        &self,
        key: &str,
        value: Option<Bytes>,
        options: ObjectOptions,
    ) -> ObjectResult<Object<C>> {
        let resolved = self.defaults.clone().merge(options);
        Object::new(self.connection.clone(), key, value, resolved)
    }

    /// Write `value` under `key`; `true` on a 200 answer.
    pub async fn store(
        &self,
        key: &str,
        value: impl Into<Bytes>,
        options: ObjectOptions,
    ) -> ObjectResult<bool> {
        let mut object = self.object_with(key, Some(value.into()), options)?;
        object.save().await
    }

    pub async fn exists(&self, key: &str) -> ObjectResult<bool> {
        self.object(key)?.exists().await
    }

    /// Fetch `key` into a populated handle.
    pub async fn fetch(&self, key: &str) -> ObjectResult<Object<C>> {
        let mut object = self.object(key)?;
        object.fetch().await?;
        Ok(object)
    }

    pub async fn delete(&self, key: &str) -> ObjectResult<bool> {
        Object::bare(self.connection.clone(), normalize_key(key)).delete().await
    }
}
