//! Body type tags shared by request encoding and response decoding.

use std::fmt;

pub const CONTENT_TYPE_FORM_DATA: &str = "multipart/form-data";
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_JSON_PROBLEM: &str = "application/problem+json";
pub const CONTENT_TYPE_OCTET_STREAM: &str = "application/octet-stream";
pub const CONTENT_TYPE_TEXT: &str = "plain/text";
const CONTENT_TYPE_TEXT_PLAIN: &str = "text/plain";

/// Shape of a request or response body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BodyType {
    /// Raw binary buffer.
    Bytes,
    /// Binary object with an optional MIME type.
    Blob,
    /// Multipart form. Never gets an explicit content type on requests so
    /// the transport can add the boundary itself.
    FormData,
    Json,
    Text,
}

impl BodyType {
    /// Canonical content type sent for a request body of this type.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Bytes | Self::Blob => CONTENT_TYPE_OCTET_STREAM,
            Self::FormData => CONTENT_TYPE_FORM_DATA,
            Self::Json => CONTENT_TYPE_JSON,
            Self::Text => CONTENT_TYPE_TEXT,
        }
    }

    /// Picks how a response body is read from its content type header.
    ///
    /// Returns `None` when the body should not be deserialized at all.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let content_type = content_type.trim().to_ascii_lowercase();
        if content_type.starts_with(CONTENT_TYPE_JSON)
            || content_type.starts_with(CONTENT_TYPE_JSON_PROBLEM)
        {
            Some(Self::Json)
        } else if content_type.starts_with(CONTENT_TYPE_FORM_DATA) {
            Some(Self::FormData)
        } else if content_type.starts_with(CONTENT_TYPE_TEXT)
            || content_type.starts_with(CONTENT_TYPE_TEXT_PLAIN)
        {
            Some(Self::Text)
        } else {
            None
        }
    }
}

impl fmt::Display for BodyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bytes => "bytes",
            Self::Blob => "blob",
            Self::FormData => "form-data",
            Self::Json => "json",
            Self::Text => "text",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_for_request_bodies() {
        assert_eq!(BodyType::Bytes.content_type(), "application/octet-stream");
        assert_eq!(BodyType::Blob.content_type(), "application/octet-stream");
        assert_eq!(BodyType::Json.content_type(), "application/json");
        assert_eq!(BodyType::Text.content_type(), "plain/text");
    }

    #[test]
    fn response_body_type_from_content_type() {
        assert_eq!(
            BodyType::from_content_type("application/json; charset=utf-8"),
            Some(BodyType::Json)
        );
        assert_eq!(
            BodyType::from_content_type("application/problem+json"),
            Some(BodyType::Json)
        );
        assert_eq!(
            BodyType::from_content_type("multipart/form-data; boundary=abc"),
            Some(BodyType::FormData)
        );
        assert_eq!(BodyType::from_content_type("plain/text"), Some(BodyType::Text));
        assert_eq!(
            BodyType::from_content_type("Text/Plain; charset=utf-8"),
            Some(BodyType::Text)
        );
        assert_eq!(BodyType::from_content_type("text/html"), None);
        assert_eq!(BodyType::from_content_type(""), None);
    }
}
