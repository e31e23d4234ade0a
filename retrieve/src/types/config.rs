use std::fmt;
use std::time::Duration;

use serde::Serialize;

use super::{HeadersInit, Init, Payload};
use crate::handler::{
    BeforeRequestHandler, RequestErrorHandler, ResponseErrorHandler, ResponseSuccessHandler,
};

/// Describes a single request.
///
/// Built once by the caller and only ever read by the pipeline.
#[derive(Clone, Default)]
pub struct RetrieveConfig {
    /// Absolute URL, or a path resolved against `base_url`.
    pub url: String,
    /// Base for relative URLs. Ignored when `url` is absolute.
    pub base_url: Option<String>,
    /// Query parameters set on the URL, overriding same-named ones.
    pub params: Option<Vec<(String, String)>>,
    pub init: Init,
    /// Request body data. `Some` means present, whatever the value.
    pub data: Option<Payload>,
    /// Replaces the transport failure's message; the original becomes the cause.
    pub request_error_message: Option<String>,
    /// Replaces the default `"<status> <status text>"` message.
    pub response_error_message: Option<String>,
    /// `None` or zero disables the timeout.
    pub timeout: Option<Duration>,
    pub before_request_handlers: Vec<BeforeRequestHandler>,
    pub request_error_handlers: Vec<RequestErrorHandler>,
    pub response_success_handlers: Vec<ResponseSuccessHandler>,
    pub response_error_handlers: Vec<ResponseErrorHandler>,
}

impl RetrieveConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Adds a query parameter. A later parameter with the same name wins.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .get_or_insert_with(Vec::new)
            .push((name.into(), value.into()));
        self
    }

    pub fn with_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let list = self.params.get_or_insert_with(Vec::new);
        list.extend(
            params
                .into_iter()
                .map(|(name, value)| (name.into(), value.into())),
        );
        self
    }

    pub fn with_init(mut self, init: Init) -> Self {
        self.init = init;
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.init.method = Some(method.into());
        self
    }

    pub fn with_headers(mut self, headers: impl Into<HeadersInit>) -> Self {
        self.init.headers = Some(headers.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.init = self.init.with_header(name, value);
        self
    }

    pub fn with_data(mut self, data: impl Into<Payload>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Sets any serializable value as JSON data.
    pub fn with_json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        self.data = Some(Payload::json(value)?);
        Ok(self)
    }

    pub fn with_request_error_message(mut self, message: impl Into<String>) -> Self {
        self.request_error_message = Some(message.into());
        self
    }

    pub fn with_response_error_message(mut self, message: impl Into<String>) -> Self {
        self.response_error_message = Some(message.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_timeout_ms(self, millis: u64) -> Self {
        self.with_timeout(Duration::from_millis(millis))
    }

    pub fn with_before_request_handler(mut self, handler: BeforeRequestHandler) -> Self {
        self.before_request_handlers.push(handler);
        self
    }

    pub fn with_request_error_handler(mut self, handler: RequestErrorHandler) -> Self {
        self.request_error_handlers.push(handler);
        self
    }

    pub fn with_response_success_handler(mut self, handler: ResponseSuccessHandler) -> Self {
        self.response_success_handlers.push(handler);
        self
    }

    pub fn with_response_error_handler(mut self, handler: ResponseErrorHandler) -> Self {
        self.response_error_handlers.push(handler);
        self
    }
}

impl fmt::Debug for RetrieveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrieveConfig")
            .field("url", &self.url)
            .field("base_url", &self.base_url)
            .field("params", &self.params)
            .field("init", &self.init)
            .field("data", &self.data)
            .field("request_error_message", &self.request_error_message)
            .field("response_error_message", &self.response_error_message)
            .field("timeout", &self.timeout)
            .field("before_request_handlers", &self.before_request_handlers.len())
            .field("request_error_handlers", &self.request_error_handlers.len())
            .field("response_success_handlers", &self.response_success_handlers.len())
            .field("response_error_handlers", &self.response_error_handlers.len())
            .finish()
    }
}
