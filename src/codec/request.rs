//! Request encoder: turns an [`Attributes`] set into write-request headers.
//!
//! Each attribute family contributes its own headers. The contributors run
//! in a fixed order, so the same attribute set always yields the same header
//! list.

use crate::{
    codec::headers::RequestHeaders,
    errors::ObjectResult,
    models::{
        attributes::{Attributes, Digest, digest_bytes},
        metadata::Meta,
    },
};
use base64::{Engine as _, engine::general_purpose};

pub const CONTENT_DISPOSITION: &str = "Content-Disposition";
pub const CONTENT_ENCODING: &str = "Content-Encoding";
pub const CONTENT_LENGTH: &str = "Content-Length";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const CACHE_CONTROL: &str = "Cache-Control";
pub const EXPIRES: &str = "Expires";
pub const PRAGMA: &str = "Pragma";
pub const CONTENT_MD5: &str = "Content-MD5";
pub const SERVER_SIDE_ENCRYPTION: &str = "x-amz-server-side-encryption";
pub const ACL: &str = "x-amz-acl";
pub const STORAGE_CLASS: &str = "x-amz-storage-class";

/// What a contributor sees: the attribute set and the payload size.
#[derive(Debug, Clone, Copy)]
pub struct EncodeInput<'a> {
    pub attributes: &'a Attributes,
    pub size: u64,
}

/// One attribute family's share of the outbound headers.
pub trait HeaderContributor: Sync {
    fn contribute(&self, input: &EncodeInput<'_>, headers: &mut RequestHeaders)
    -> ObjectResult<()>;
}

/// Content and caching headers copied verbatim, plus `Content-Length`.
pub struct StandardHeaders;

/// `Content-MD5`, base64 of the raw 16-byte digest.
pub struct ContentMd5;

/// Canned ACL.
pub struct AccessPolicy;

pub struct StorageClassHeader;

/// `x-amz-meta-*` entries.
pub struct UserMetadata;

/// Encoding order.
pub const CONTRIBUTORS: [&dyn HeaderContributor; 5] = [
    &StandardHeaders,
    &ContentMd5,
    &AccessPolicy,
    &StorageClassHeader,
    &UserMetadata,
];

impl HeaderContributor for StandardHeaders {
    fn contribute(
        &self,
        input: &EncodeInput<'_>,
        headers: &mut RequestHeaders,
    ) -> ObjectResult<()> {
        let attrs = input.attributes;
        let size = input.size.to_string();
        let fields: [(&str, Option<&str>); 8] = [
            (CONTENT_DISPOSITION, attrs.content_disposition.as_deref()),
            (CONTENT_ENCODING, attrs.content_encoding.as_deref()),
            (CONTENT_LENGTH, Some(size.as_str())),
            (CONTENT_TYPE, attrs.content_type.as_deref()),
            (CACHE_CONTROL, attrs.cache_control.as_deref()),
            (EXPIRES, attrs.expires.as_deref()),
            (PRAGMA, attrs.pragma.as_deref()),
            (SERVER_SIDE_ENCRYPTION, attrs.sse.as_deref()),
        ];

        // absent and empty values are never sent
        for (name, value) in fields {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                headers.insert(name, value);
            }
        }
        Ok(())
    }
}

impl HeaderContributor for ContentMd5 {
    fn contribute(
        &self,
        input: &EncodeInput<'_>,
        headers: &mut RequestHeaders,
    ) -> ObjectResult<()> {
        match &input.attributes.content_md5 {
            Digest::Precomputed(hex) => {
                headers.insert(CONTENT_MD5, content_md5_header(hex)?);
            }
            // resolved by the transform pipeline before encoding
            Digest::AutoCompute | Digest::Unset => {}
        }
        Ok(())
    }
}

impl HeaderContributor for AccessPolicy {
    fn contribute(
        &self,
        input: &EncodeInput<'_>,
        headers: &mut RequestHeaders,
    ) -> ObjectResult<()> {
        if let Some(access) = input.attributes.access {
            headers.insert(ACL, access.header_value());
        }
        Ok(())
    }
}

impl HeaderContributor for StorageClassHeader {
    fn contribute(
        &self,
        input: &EncodeInput<'_>,
        headers: &mut RequestHeaders,
    ) -> ObjectResult<()> {
        if let Some(class) = input.attributes.storage_class {
            headers.insert(STORAGE_CLASS, class.header_value());
        }
        Ok(())
    }
}

impl HeaderContributor for UserMetadata {
    fn contribute(
        &self,
        input: &EncodeInput<'_>,
        headers: &mut RequestHeaders,
    ) -> ObjectResult<()> {
        for (key, value) in input.attributes.meta.iter() {
            headers.insert(Meta::header_name(key), value);
        }
        Ok(())
    }
}

/// Convert a hex MD5 digest into the `Content-MD5` header form:
/// hex -> 16 raw bytes -> base64.
pub fn content_md5_header(hex: &str) -> ObjectResult<String> {
    let raw = digest_bytes(hex.trim())?;
    Ok(general_purpose::STANDARD.encode(raw).trim().to_string())
}

/// Build the header list for a write of `size` bytes.
pub fn encode(attributes: &Attributes, size: u64) -> ObjectResult<RequestHeaders> {
    let input = EncodeInput { attributes, size };
    let mut headers = RequestHeaders::new();
    for contributor in CONTRIBUTORS {
        contributor.contribute(&input, &mut headers)?;
    }
    headers.validate()?;
    Ok(headers)
}
