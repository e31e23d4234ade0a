//! Error types for the request pipeline.

use std::time::Duration;

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::types::{Envelope, Response, ResponseData};

/// Boxed error used at the transport and handler seams.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

const UNKNOWN_REQUEST_ERROR: &str = "Unknown request error";
const UNKNOWN_RESPONSE_ERROR: &str = "Unknown response error";

/// Errors that can occur when calling [`retrieve`](crate::retrieve).
///
/// Exactly one of these is returned per failed invocation.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The configuration could not be turned into a URL or request init.
    #[error("Invalid request configuration: {0}")]
    Config(String),
    /// Sending the request failed and no request error handler corrected it.
    #[error(transparent)]
    Request(#[from] RequestError),
    /// The response had a non-success status that no response error handler
    /// corrected, or its body could not be deserialized.
    #[error(transparent)]
    Response(#[from] ResponseError),
    /// A handler returned an error. It is passed through untouched.
    #[error("{0}")]
    Handler(BoxError),
}

impl Error {
    /// Returns the request error if this is a transport failure.
    pub fn as_request(&self) -> Option<&RequestError> {
        match self {
            Self::Request(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the response error if this is a response failure.
    pub fn as_response(&self) -> Option<&ResponseError> {
        match self {
            Self::Response(e) => Some(e),
            _ => None,
        }
    }
}

/// Sending a request failed (network, DNS, cancellation).
#[derive(thiserror::Error, Debug)]
#[error("{message}")]
pub struct RequestError {
    message: String,
    cause: Option<String>,
    #[source]
    source: Option<BoxError>,
}

impl RequestError {
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            message: if message.is_empty() {
                UNKNOWN_REQUEST_ERROR.to_string()
            } else {
                message
            },
            cause: None,
            source: None,
        }
    }

    /// Wraps a failure reported by the transport.
    ///
    /// The failure's own message becomes the cause. The configured message
    /// wins over the failure's message, which wins over the generic fallback.
    pub(crate) fn from_transport(error: BoxError, configured: Option<&str>) -> Self {
        let original = error.to_string();
        let cause = (!original.is_empty()).then(|| original.clone());
        let message = match configured {
            Some(message) if !message.is_empty() => message.to_string(),
            _ if !original.is_empty() => original,
            _ => UNKNOWN_REQUEST_ERROR.to_string(),
        };
        Self {
            message,
            cause,
            source: Some(error),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.set_message(message);
        self
    }

    /// The message of the underlying failure, if it had one.
    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }

    /// True if the request was cancelled because its timeout elapsed.
    pub fn is_timeout(&self) -> bool {
        match self.source.as_deref() {
            Some(source) => {
                source
                    .downcast_ref::<AbortError>()
                    .is_some_and(AbortError::is_timeout)
                    || source
                        .downcast_ref::<reqwest::Error>()
                        .is_some_and(reqwest::Error::is_timeout)
            }
            None => false,
        }
    }

    /// True if the request was cancelled through its signal for any reason.
    pub fn is_aborted(&self) -> bool {
        self.source
            .as_deref()
            .is_some_and(|source| source.is::<AbortError>())
    }
}

/// The transport succeeded but the response is not usable: either its
/// status is outside 200-299 or its body could not be deserialized.
#[derive(thiserror::Error, Debug, Clone)]
#[error("{message}")]
pub struct ResponseError {
    message: String,
    cause: Option<String>,
    response: Response,
    data: Option<ResponseData>,
}

impl ResponseError {
    /// Builds the error for a non-success envelope.
    ///
    /// Without an explicit message, the message is `"<status> <status text>"`.
    pub fn new(envelope: &Envelope, message: Option<&str>) -> Self {
        let message = match message {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => status_message(&envelope.response),
        };
        Self {
            message,
            cause: None,
            response: envelope.response.clone(),
            data: envelope.data.clone(),
        }
    }

    /// Builds the error for a body that failed to deserialize, keeping the
    /// failure's message and the failure's own cause.
    pub(crate) fn from_body_failure(response: Response, error: &BodyError) -> Self {
        let message = error.to_string();
        Self {
            message: if message.is_empty() {
                UNKNOWN_RESPONSE_ERROR.to_string()
            } else {
                message
            },
            cause: std::error::Error::source(error).map(|cause| cause.to_string()),
            response,
            data: None,
        }
    }

    pub fn name(&self) -> &'static str {
        "ResponseError"
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.set_message(message);
        self
    }

    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Deserialized body of the failing response, if any.
    pub fn data(&self) -> Option<&ResponseData> {
        self.data.as_ref()
    }

    pub fn status(&self) -> u16 {
        self.response.status()
    }
}

impl Serialize for ResponseError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ResponseError", 2)?;
        state.serialize_field("name", self.name())?;
        state.serialize_field("message", &self.message)?;
        state.end()
    }
}

fn status_message(response: &Response) -> String {
    let status = match response.status() {
        0 => String::new(),
        status => status.to_string(),
    };
    let message = format!("{} {}", status, response.status_text());
    match message.trim() {
        "" => UNKNOWN_RESPONSE_ERROR.to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Reading or parsing a response body failed.
#[derive(thiserror::Error, Debug)]
pub enum BodyError {
    #[error("Body has already been consumed")]
    AlreadyUsed,
    #[error(transparent)]
    Read(#[from] reqwest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Multipart(#[from] multer::Error),
}

/// Why a cancellation signal fired.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    #[error("The operation timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("The operation was aborted")]
    Aborted,
}

impl AbortError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
