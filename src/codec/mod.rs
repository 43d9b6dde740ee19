//! Header codec: request encoding, response decoding and the payload
//! transforms that run before a write.

pub mod headers;
pub mod request;
pub mod response;
pub mod transform;
