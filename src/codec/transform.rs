//! Payload transforms applied before a write: gzip first, then the digest.

use crate::{
    errors::{ObjectError, ObjectResult},
    models::attributes::{Attributes, Digest},
};
use bytes::Bytes;
use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use std::io::{Read, Write};
use tracing::debug;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Lower-case hex MD5 of `data`.
pub fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

pub fn gzip(data: &[u8]) -> ObjectResult<Bytes> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(ObjectError::Compression)?;
    let compressed = encoder.finish().map_err(ObjectError::Compression)?;
    Ok(Bytes::from(compressed))
}

pub fn gunzip(data: &[u8]) -> ObjectResult<Bytes> {
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(ObjectError::Compression)?;
    Ok(Bytes::from(decompressed))
}

/// True when `data` starts with the gzip member header.
pub fn is_gzip(data: &[u8]) -> bool {
    data.starts_with(&GZIP_MAGIC)
}

/// Run the write-side pipeline and return the payload to send.
///
/// With `gzip` requested the value is compressed and `content_encoding`
/// forced to `gzip`. `already_compressed` marks a value that is the output of
/// an earlier pass; the payload itself is never inspected, so plaintext that
/// happens to be a gzip archive is still compressed. An `AutoCompute` digest
/// is then resolved against the final bytes.
pub fn prepare(
    attributes: &mut Attributes,
    value: Bytes,
    already_compressed: bool,
) -> ObjectResult<Bytes> {
    let value = if attributes.gzip {
        attributes.content_encoding = Some("gzip".to_string());
        if already_compressed {
            value
        } else {
            let compressed = gzip(&value)?;
            debug!(
                original = value.len(),
                compressed = compressed.len(),
                "gzip applied to payload"
            );
            compressed
        }
    } else {
        value
    };

    if attributes.content_md5 == Digest::AutoCompute {
        let hex = md5_hex(&value);
        debug!(digest = %hex, "content-md5 computed");
        attributes.content_md5 = Digest::Precomputed(hex);
    }

    Ok(value)
}
