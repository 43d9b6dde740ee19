//! Typed attribute set describing an object on the write path.

use crate::{
    errors::{ObjectError, ObjectResult},
    models::metadata::Meta,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Content type sent when the key's extension is unknown.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Canned ACL applied with the `x-amz-acl` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Private,
    PublicRead,
    PublicReadWrite,
    AuthenticatedRead,
    AwsExecRead,
    BucketOwnerRead,
    BucketOwnerFullControl,
    LogDeliveryWrite,
}

impl Access {
    /// Snake-case name, as written in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Access::Private => "private",
            Access::PublicRead => "public_read",
            Access::PublicReadWrite => "public_read_write",
            Access::AuthenticatedRead => "authenticated_read",
            Access::AwsExecRead => "aws_exec_read",
            Access::BucketOwnerRead => "bucket_owner_read",
            Access::BucketOwnerFullControl => "bucket_owner_full_control",
            Access::LogDeliveryWrite => "log_delivery_write",
        }
    }

    /// Wire form: underscores become hyphens (`public_read` -> `public-read`).
    pub fn header_value(&self) -> String {
        self.as_str().replace('_', "-")
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Access {
    type Err = ObjectError;

    /// Accepts either the configuration or the wire spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "private" => Ok(Access::Private),
            "public_read" => Ok(Access::PublicRead),
            "public_read_write" => Ok(Access::PublicReadWrite),
            "authenticated_read" => Ok(Access::AuthenticatedRead),
            "aws_exec_read" => Ok(Access::AwsExecRead),
            "bucket_owner_read" => Ok(Access::BucketOwnerRead),
            "bucket_owner_full_control" => Ok(Access::BucketOwnerFullControl),
            "log_delivery_write" => Ok(Access::LogDeliveryWrite),
            _ => Err(ObjectError::InvalidAttribute {
                name: "access",
                value: s.to_string(),
            }),
        }
    }
}

/// Storage tier requested with `x-amz-storage-class`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageClass {
    Standard,
    ReducedRedundancy,
    StandardIa,
    OnezoneIa,
    IntelligentTiering,
    GlacierIr,
    Glacier,
    DeepArchive,
}

impl StorageClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageClass::Standard => "standard",
            StorageClass::ReducedRedundancy => "reduced_redundancy",
            StorageClass::StandardIa => "standard_ia",
            StorageClass::OnezoneIa => "onezone_ia",
            StorageClass::IntelligentTiering => "intelligent_tiering",
            StorageClass::GlacierIr => "glacier_ir",
            StorageClass::Glacier => "glacier",
            StorageClass::DeepArchive => "deep_archive",
        }
    }

    /// Wire form, upper-cased (`reduced_redundancy` -> `REDUCED_REDUNDANCY`).
    pub fn header_value(&self) -> String {
        self.as_str().to_ascii_uppercase()
    }
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageClass {
    type Err = ObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "standard" => Ok(StorageClass::Standard),
            "reduced_redundancy" => Ok(StorageClass::ReducedRedundancy),
            "standard_ia" => Ok(StorageClass::StandardIa),
            "onezone_ia" => Ok(StorageClass::OnezoneIa),
            "intelligent_tiering" => Ok(StorageClass::IntelligentTiering),
            "glacier_ir" => Ok(StorageClass::GlacierIr),
            "glacier" => Ok(StorageClass::Glacier),
            "deep_archive" => Ok(StorageClass::DeepArchive),
            _ => Err(ObjectError::InvalidAttribute {
                name: "storage_class",
                value: s.to_string(),
            }),
        }
    }
}

/// Content-MD5 request state.
///
/// `AutoCompute` is resolved into `Precomputed` by the transform pipeline
/// during `save`; nothing else changes the variant behind the caller's back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Digest {
    #[default]
    Unset,
    AutoCompute,
    Precomputed(String),
}

impl Digest {
    /// Validate and wrap a hex MD5 digest (32 hex characters).
    pub fn from_hex(hex: &str) -> ObjectResult<Self> {
        let hex = hex.trim();
        digest_bytes(hex)?;
        Ok(Digest::Precomputed(hex.to_ascii_lowercase()))
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Digest::Unset)
    }

    pub fn as_hex(&self) -> Option<&str> {
        match self {
            Digest::Precomputed(hex) => Some(hex),
            _ => None,
        }
    }
}

impl From<bool> for Digest {
    fn from(compute: bool) -> Self {
        if compute {
            Digest::AutoCompute
        } else {
            Digest::Unset
        }
    }
}

/// Decode a hex MD5 digest into its 16 raw bytes, failing on anything that
/// is not exactly 32 hex characters.
pub fn digest_bytes(hex: &str) -> ObjectResult<[u8; 16]> {
    if hex.len() != 32 {
        return Err(ObjectError::InvalidDigest {
            value: hex.to_string(),
            reason: format!("expected 32 hex characters, got {}", hex.len()),
        });
    }
    let mut raw = [0u8; 16];
    hex::decode_to_slice(hex, &mut raw).map_err(|err| ObjectError::InvalidDigest {
        value: hex.to_string(),
        reason: err.to_string(),
    })?;
    Ok(raw)
}

/// Optional attributes of an object. Every field starts unset except
/// `content_type`, which the handle infers from the key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub content_encoding: Option<String>,
    pub cache_control: Option<String>,
    pub expires: Option<String>,
    pub pragma: Option<String>,
    pub content_md5: Digest,
    pub access: Option<Access>,
    pub storage_class: Option<StorageClass>,
    /// Server-side encryption algorithm, e.g. `AES256`.
    pub sse: Option<String>,
    pub meta: Meta,
    /// Compress the payload with gzip before it is sent.
    pub gzip: bool,
}

impl Attributes {
    /// Attribute set with `content_type` inferred from `key`.
    pub fn for_key(key: &str) -> Self {
        Self {
            content_type: Some(infer_content_type(key).to_string()),
            ..Self::default()
        }
    }

    /// Set `Expires` from a timestamp, rendered as an HTTP-date.
    pub fn set_expires_at(&mut self, at: DateTime<Utc>) {
        self.expires = Some(at.format("%a, %d %b %Y %H:%M:%S GMT").to_string());
    }
}

/// MIME type for the key's extension, matched case-insensitively.
pub fn infer_content_type(key: &str) -> &'static str {
    mime_guess::from_path(key)
        .first_raw()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}
