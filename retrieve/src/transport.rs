//! The transport seam: anything that can send a request and yield a response.

use std::future::Future;

use futures::future::BoxFuture;
use reqwest::multipart;
use reqwest::redirect::Policy;
use url::Url;

use crate::errors::BoxError;
use crate::types::{FormData, FormValue, Payload, RedirectMode, RequestInit, Response};

/// Sends one request and yields the raw response.
///
/// Failing here means the request never produced a response (network, DNS,
/// cancellation). Non-success statuses are responses, not failures.
pub trait Transport: Send + Sync {
    fn send(&self, url: Url, init: RequestInit) -> BoxFuture<'_, Result<Response, BoxError>>;
}

impl<F, Fut> Transport for F
where
    F: Fn(Url, RequestInit) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, BoxError>> + Send + 'static,
{
    fn send(&self, url: Url, init: RequestInit) -> BoxFuture<'_, Result<Response, BoxError>> {
        Box::pin(self(url, init))
    }
}

/// Default transport backed by `reqwest`.
///
/// Builds a fresh `reqwest::Client` per request, configured with the init's
/// redirect mode. Connections are not reused between requests.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    user_agent: Option<String>,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    fn client(&self, redirect: RedirectMode) -> Result<reqwest::Client, reqwest::Error> {
        let policy = match redirect {
            RedirectMode::Follow => Policy::default(),
            RedirectMode::Manual => Policy::none(),
            RedirectMode::Error => {
                Policy::custom(|attempt| attempt.error("redirect mode is set to error"))
            }
        };
        let mut builder = reqwest::Client::builder().redirect(policy);
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        builder.build()
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, url: Url, init: RequestInit) -> BoxFuture<'_, Result<Response, BoxError>> {
        Box::pin(async move {
            let client = self.client(init.redirect).map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                e
            })?;

            let mut request = client.request(init.method, url).headers(init.headers);
            if let Some(body) = init.body {
                request = match body {
                    Payload::Bytes(bytes) => request.body(bytes),
                    Payload::Blob(blob) => request.body(blob.bytes().clone()),
                    Payload::Text(text) => request.body(text),
                    Payload::Json(value) => request.body(serde_json::to_vec(&value)?),
                    Payload::Form(form) => request.multipart(multipart_form(form)?),
                };
            }

            let response = request.send().await.map_err(|e| {
                tracing::error!("Failed to send request: {}", e);
                e
            })?;
            Ok::<_, BoxError>(Response::from_reqwest(response))
        })
    }
}

fn multipart_form(form: FormData) -> Result<multipart::Form, reqwest::Error> {
    let mut multipart = multipart::Form::new();
    for (name, value) in form.entries() {
        multipart = match value {
            FormValue::Text(text) => multipart.text(name.clone(), text.clone()),
            FormValue::File { blob, file_name } => {
                let mut part = multipart::Part::bytes(blob.bytes().to_vec());
                if let Some(file_name) = file_name {
                    part = part.file_name(file_name.clone());
                }
                if let Some(mime_type) = blob.mime_type() {
                    part = part.mime_str(mime_type)?;
                }
                multipart.part(name.clone(), part)
            }
        };
    }
    Ok(multipart)
}
