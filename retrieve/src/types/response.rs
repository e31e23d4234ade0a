use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use super::{Blob, FormData, FormValue};
use crate::body::{BodyType, CONTENT_TYPE_JSON};
use crate::errors::{BodyError, ResponseError};

enum ResponseBody {
    Buffered(Bytes),
    Streaming(reqwest::Response),
    Used,
}

/// A raw HTTP response whose body can be read at most once.
///
/// Clones share the same body, so reading through one clone consumes it
/// for all of them.
#[derive(Clone)]
pub struct Response {
    status: u16,
    status_text: String,
    headers: HeaderMap,
    url: Option<Url>,
    body: Arc<Mutex<ResponseBody>>,
}

impl Response {
    /// Builds a response with a buffered body. The status text defaults to
    /// the canonical reason phrase of `status`, if any.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        let status_text = StatusCode::from_u16(status)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self {
            status,
            status_text,
            headers: HeaderMap::new(),
            url: None,
            body: Arc::new(Mutex::new(ResponseBody::Buffered(body.into()))),
        }
    }

    /// Builds a response with a JSON body and matching content type.
    pub fn from_json(status: u16, value: &Value) -> Self {
        Self::new(status, value.to_string())
            .with_header(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON))
    }

    /// Builds a response with a plain text body.
    pub fn from_text(status: u16, text: impl Into<String>) -> Self {
        Self::new(status, text.into()).with_header(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        )
    }

    /// Wraps a `reqwest` response without reading its body.
    pub fn from_reqwest(response: reqwest::Response) -> Self {
        let status = response.status();
        Self {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers: response.headers().clone(),
            url: Some(response.url().clone()),
            body: Arc::new(Mutex::new(ResponseBody::Streaming(response))),
        }
    }

    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = status_text.into();
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// True for statuses in 200-299.
    pub fn ok(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Looks up a header by name, case-insensitively. Values that are not
    /// visible ASCII are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    pub fn body_used(&self) -> bool {
        matches!(*self.lock_body(), ResponseBody::Used)
    }

    pub async fn bytes(&self) -> Result<Bytes, BodyError> {
        let body = std::mem::replace(&mut *self.lock_body(), ResponseBody::Used);
        match body {
            ResponseBody::Buffered(bytes) => Ok(bytes),
            ResponseBody::Streaming(response) => Ok(response.bytes().await?),
            ResponseBody::Used => Err(BodyError::AlreadyUsed),
        }
    }

    pub async fn text(&self) -> Result<String, BodyError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn json(&self) -> Result<Value, BodyError> {
        let bytes = self.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Parses a `multipart/form-data` body using the boundary from the
    /// content type header.
    pub async fn form_data(&self) -> Result<FormData, BodyError> {
        let boundary = multer::parse_boundary(self.header(CONTENT_TYPE.as_str()).unwrap_or_default())?;
        let bytes = self.bytes().await?;
        let stream = futures::stream::once(async move { Ok::<Bytes, std::io::Error>(bytes) });
        let mut multipart = multer::Multipart::new(stream, boundary);

        let mut form = FormData::new();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let mime_type = field.content_type().map(|mime| mime.to_string());
                    let mut blob = Blob::new(field.bytes().await?);
                    if let Some(mime_type) = mime_type {
                        blob = blob.with_type(mime_type);
                    }
                    form.append(
                        name,
                        FormValue::File {
                            blob,
                            file_name: Some(file_name),
                        },
                    );
                }
                None => {
                    let text = field.text().await?;
                    form.append(name, FormValue::Text(text));
                }
            }
        }
        Ok(form)
    }

    fn lock_body(&self) -> std::sync::MutexGuard<'_, ResponseBody> {
        self.body.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("status_text", &self.status_text)
            .field("headers", &self.headers)
            .field("url", &self.url)
            .field("body_used", &self.body_used())
            .finish()
    }
}

/// A deserialized response body.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseData {
    Json(Value),
    Text(String),
    Form(FormData),
}

impl ResponseData {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_form(&self) -> Option<&FormData> {
        match self {
            Self::Form(form) => Some(form),
            _ => None,
        }
    }
}

/// A response paired with its deserialized body.
#[derive(Clone, Debug)]
pub struct Envelope {
    pub response: Response,
    /// `None` when the content type is not one that gets deserialized.
    pub data: Option<ResponseData>,
}

impl Envelope {
    /// Reads and deserializes the body according to its content type.
    ///
    /// Fails with a [`ResponseError`] if the body cannot be read or parsed,
    /// whatever the status.
    pub async fn read(response: Response) -> Result<Self, ResponseError> {
        let content_type = response.header(CONTENT_TYPE.as_str()).unwrap_or_default();
        let body_type = BodyType::from_content_type(content_type);

        let data = match body_type {
            Some(BodyType::Json) => response.json().await.map(ResponseData::Json),
            Some(BodyType::FormData) => response.form_data().await.map(ResponseData::Form),
            Some(BodyType::Text) => response.text().await.map(ResponseData::Text),
            _ => return Ok(Self { response, data: None }),
        };

        match data {
            Ok(data) => Ok(Self {
                response,
                data: Some(data),
            }),
            Err(e) => {
                tracing::error!(
                    status = response.status(),
                    body_type = ?body_type,
                    "Failed to deserialize response body: {}",
                    e
                );
                Err(ResponseError::from_body_failure(response, &e))
            }
        }
    }

    pub fn ok(&self) -> bool {
        self.response.ok()
    }

    pub fn status(&self) -> u16 {
        self.response.status()
    }

    /// Deserializes JSON data into `T`. Missing or non-JSON data is read as
    /// `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let value = self
            .data
            .as_ref()
            .and_then(ResponseData::as_json)
            .cloned()
            .unwrap_or(Value::Null);
        serde_json::from_value(value)
    }
}
