//! Error types shared by the object handle, the header codec and the
//! connection collaborators.

use http::StatusCode;
use serde::Deserialize;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjectError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("gzip transform failed: {0}")]
    Compression(#[source] io::Error),
    #[error("invalid content-md5 `{value}`: {reason}")]
    InvalidDigest { value: String, reason: String },
    #[error("invalid {name} `{value}`")]
    InvalidAttribute { name: &'static str, value: String },
    #[error("header `{name}` cannot be sent: {reason}")]
    InvalidHeader { name: String, reason: String },
    #[error("invalid endpoint `{0}`")]
    InvalidEndpoint(String),
    #[error("object `{0}` has no value to save and none is stored remotely")]
    MissingValue(String),
}

pub type ObjectResult<T> = Result<T, ObjectError>;

/// Error detail reported by the remote store for a rejected request.
///
/// Built from an S3-style XML error document when the body carries one,
/// otherwise from the status code alone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code} ({}): {message}", .status.as_u16())]
pub struct RemoteError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

impl RemoteError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Fallback when the store sent no usable error body.
    pub fn from_status(status: StatusCode) -> Self {
        let reason = status.canonical_reason().unwrap_or("Unknown");
        Self::new(status, reason.replace(' ', ""), reason)
    }

    /// Parse `<Error><Code>..</Code><Message>..</Message></Error>`.
    pub fn from_body(status: StatusCode, body: &str) -> Self {
        match quick_xml::de::from_str::<ErrorBody>(body) {
            Ok(parsed) if !parsed.code.trim().is_empty() => {
                Self::new(status, parsed.code.trim(), parsed.message.trim())
            }
            _ => Self::from_status(status),
        }
    }
}

/// S3 error document; unknown elements such as `RequestId` are ignored.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Message", default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_s3_error_document() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>BadDigest</Code><Message>The Content-MD5 you specified did not match what we received.</Message></Error>"#;
        let err = RemoteError::from_body(StatusCode::BAD_REQUEST, body);
        assert_eq!(err.code, "BadDigest");
        assert_eq!(
            err.message,
            "The Content-MD5 you specified did not match what we received."
        );
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn falls_back_to_status_reason() {
        let err = RemoteError::from_body(StatusCode::FORBIDDEN, "{\"error\":\"nope\"}");
        assert_eq!(err.code, "Forbidden");
        assert_eq!(err.to_string(), "Forbidden (403): Forbidden");
    }

    #[test]
    fn unescapes_entities() {
        let body = "<Error><Code>InvalidArgument</Code><Message>a &lt; b &amp; c &#60; d</Message></Error>";
        let err = RemoteError::from_body(StatusCode::BAD_REQUEST, body);
        assert_eq!(err.message, "a < b & c < d");
    }

    #[test]
    fn reads_cdata_and_ignores_extra_elements() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Code><![CDATA[NoSuchKey]]></Code>
  <Message>The specified key does not exist.</Message>
  <Key>photos/a.jpg</Key>
  <RequestId>4442587FB7D0A2F9</RequestId>
</Error>"#;
        let err = RemoteError::from_body(StatusCode::NOT_FOUND, body);
        assert_eq!(err.code, "NoSuchKey");
        assert_eq!(err.message, "The specified key does not exist.");
    }

    #[test]
    fn missing_message_is_empty() {
        let body = "<Error><Code>AccessDenied</Code></Error>";
        let err = RemoteError::from_body(StatusCode::FORBIDDEN, body);
        assert_eq!(err.code, "AccessDenied");
        assert_eq!(err.message, "");
    }

    #[test]
    fn empty_code_falls_back_to_status() {
        let err = RemoteError::from_body(StatusCode::FORBIDDEN, "<Error><Code/></Error>");
        assert_eq!(err.code, "Forbidden");
    }
}
