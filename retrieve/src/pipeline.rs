//! Runs a single request from configuration to final envelope.

use crate::errors::{BoxError, Error, RequestError, ResponseError};
use crate::handler::{self, FetchParams};
use crate::request::{build_init, build_url};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{Envelope, Response, RetrieveConfig};

/// Sends the request described by `config` with a fresh [`ReqwestTransport`].
///
/// See [`retrieve_with`].
pub async fn retrieve(config: &RetrieveConfig) -> Result<Envelope, Error> {
    retrieve_with(&ReqwestTransport::new(), config).await
}

/// Sends the request described by `config` through `transport`.
///
/// 1. Builds the URL and init, then runs the before-request handlers.
/// 2. Calls the transport, racing it against the init's signal. On failure
///    the request error handlers may correct it with a replacement response.
/// 3. Reads the response into an envelope.
/// 4. Runs the response success handlers for 200-299 statuses, and the
///    response error handlers for anything else.
///
/// Errors returned by handlers are passed through as [`Error::Handler`].
pub async fn retrieve_with<T>(transport: &T, config: &RetrieveConfig) -> Result<Envelope, Error>
where
    T: Transport + ?Sized,
{
    let url = build_url(config)?;
    let init = build_init(config)?;
    let params = handler::run_before_request(&config.before_request_handlers, (url, init)).await?;

    tracing::debug!(method = %params.1.method, url = %params.0, "Sending request");
    let response = match send(transport, &params).await {
        Ok(response) => response,
        Err(e) => {
            let error = RequestError::from_transport(e, config.request_error_message.as_deref());
            tracing::debug!(
                handlers = config.request_error_handlers.len(),
                timeout = error.is_timeout(),
                "Transport failed: {}",
                error
            );
            handler::run_request_error(&config.request_error_handlers, error, &params).await?
        }
    };

    let envelope = Envelope::read(response).await?;
    tracing::debug!(status = envelope.status(), ok = envelope.ok(), "Received response");

    if envelope.ok() {
        return handler::run_response_success(&config.response_success_handlers, envelope).await;
    }

    let error = ResponseError::new(&envelope, config.response_error_message.as_deref());
    handler::run_response_error(&config.response_error_handlers, error, envelope, &params).await
}

async fn send<T>(transport: &T, (url, init): &FetchParams) -> Result<Response, BoxError>
where
    T: Transport + ?Sized,
{
    let request = transport.send(url.clone(), init.clone());
    match &init.signal {
        Some(signal) => tokio::select! {
            biased;
            reason = signal.aborted() => Err(BoxError::from(reason)),
            result = request => result,
        },
        None => request.await,
    }
}
