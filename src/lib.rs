//! Single-object handle for S3-compatible stores.
//!
//! An [`Object`] carries a key, an optional payload and a typed attribute
//! set. Saving runs the payload transforms (gzip, Content-MD5), encodes the
//! attributes as request headers in a fixed order and hands everything to a
//! [`Connection`]. Reading decodes response headers back into attributes.

pub mod codec;
pub mod config;
pub mod connection;
pub mod errors;
pub mod models;

pub use config::ObjectOptions;
pub use connection::{Connection, Response, http::HttpConnection, memory::MemoryConnection};
pub use errors::{ObjectError, ObjectResult, RemoteError};
pub use models::{
    attributes::{Access, Attributes, Digest, StorageClass},
    bucket::Bucket,
    metadata::Meta,
    object::Object,
};
