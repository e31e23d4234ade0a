use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;

/// Request body data.
///
/// Any variant is a valid payload, including `Json(Value::Null)`.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// Raw binary buffer, sent as `application/octet-stream` by default.
    Bytes(Bytes),
    /// Binary object, sent as `application/octet-stream` by default.
    Blob(Blob),
    /// Multipart form. The transport sets the content type and boundary.
    Form(FormData),
    Text(String),
    /// Any other structured value.
    Json(Value),
}

impl Payload {
    /// Serializes any value into a JSON payload.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}

impl From<Blob> for Payload {
    fn from(blob: Blob) -> Self {
        Self::Blob(blob)
    }
}

impl From<FormData> for Payload {
    fn from(form: FormData) -> Self {
        Self::Form(form)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

/// Immutable binary data with an optional MIME type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Blob {
    bytes: Bytes,
    mime_type: Option<String>,
}

impl Blob {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: None,
        }
    }

    pub fn with_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A single multipart form value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File {
        blob: Blob,
        file_name: Option<String>,
    },
}

impl FormValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::File { .. } => None,
        }
    }
}

/// Ordered multipart form entries. Names may repeat.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormData {
    entries: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(name, FormValue::Text(value.into()));
        self
    }

    /// Adds a file field.
    pub fn file(mut self, name: impl Into<String>, blob: Blob, file_name: Option<&str>) -> Self {
        self.append(
            name,
            FormValue::File {
                blob,
                file_name: file_name.map(str::to_string),
            },
        );
        self
    }

    pub fn append(&mut self, name: impl Into<String>, value: FormValue) {
        self.entries.push((name.into(), value));
    }

    /// First value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, value)| value)
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FormValue> + 'a {
        self.entries
            .iter()
            .filter(move |(entry, _)| entry == name)
            .map(|(_, value)| value)
    }

    pub fn entries(&self) -> &[(String, FormValue)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
