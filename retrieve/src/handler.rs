//! Interceptor handlers and the chains that run them.
//!
//! Handlers are plain async closures stored in ordered lists on the
//! [`RetrieveConfig`](crate::RetrieveConfig). Each chain runs its handlers
//! one after another; an error returned by any handler aborts the request
//! and reaches the caller as [`Error::Handler`].
//!
//! # Example
//!
//! ```ignore
//! use retrieve::{handler, ErrorHandlerResult, RetrieveConfig};
//!
//! let config = RetrieveConfig::new("https://api.example.org")
//!     .with_response_error_handler(handler::response_error(
//!         |mut error, _envelope, _url, _init| async move {
//!             error.set_message(format!("ERR: {}", error.message()));
//!             Ok(ErrorHandlerResult::Maintained(error))
//!         },
//!     ));
//! ```

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use url::Url;

use crate::errors::{BoxError, Error, RequestError, ResponseError};
use crate::types::{Envelope, RequestInit, Response};

/// Result returned by every handler.
pub type HandlerResult<T> = Result<T, BoxError>;

/// The URL and init handed to the transport.
pub type FetchParams = (Url, RequestInit);

/// Verdict of an error handler.
#[derive(Debug)]
pub enum ErrorHandlerResult<E> {
    /// The error still holds. Carries the current, possibly changed, error.
    Maintained(E),
    /// The error is resolved by this replacement response.
    Corrected(Response),
}

pub type BeforeRequestHandler =
    Arc<dyn Fn(Url, RequestInit) -> BoxFuture<'static, HandlerResult<FetchParams>> + Send + Sync>;

pub type RequestErrorHandler = Arc<
    dyn Fn(
            RequestError,
            Url,
            RequestInit,
        ) -> BoxFuture<'static, HandlerResult<ErrorHandlerResult<RequestError>>>
        + Send
        + Sync,
>;

pub type ResponseSuccessHandler =
    Arc<dyn Fn(Envelope) -> BoxFuture<'static, HandlerResult<Envelope>> + Send + Sync>;

pub type ResponseErrorHandler = Arc<
    dyn Fn(
            ResponseError,
            Envelope,
            Url,
            RequestInit,
        ) -> BoxFuture<'static, HandlerResult<ErrorHandlerResult<ResponseError>>>
        + Send
        + Sync,
>;

/// Runs right before the transport is called and may replace the URL or init.
pub fn before_request<F, Fut>(handler: F) -> BeforeRequestHandler
where
    F: Fn(Url, RequestInit) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<FetchParams>> + Send + 'static,
{
    Arc::new(move |url, init| Box::pin(handler(url, init)))
}

/// Runs when the transport call itself failed.
pub fn request_error<F, Fut>(handler: F) -> RequestErrorHandler
where
    F: Fn(RequestError, Url, RequestInit) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<ErrorHandlerResult<RequestError>>> + Send + 'static,
{
    Arc::new(move |error, url, init| Box::pin(handler(error, url, init)))
}

/// Runs when the response status is in 200-299.
pub fn response_success<F, Fut>(handler: F) -> ResponseSuccessHandler
where
    F: Fn(Envelope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<Envelope>> + Send + 'static,
{
    Arc::new(move |envelope| Box::pin(handler(envelope)))
}

/// Runs when the response status is outside 200-299.
pub fn response_error<F, Fut>(handler: F) -> ResponseErrorHandler
where
    F: Fn(ResponseError, Envelope, Url, RequestInit) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<ErrorHandlerResult<ResponseError>>> + Send + 'static,
{
    Arc::new(move |error, envelope, url, init| Box::pin(handler(error, envelope, url, init)))
}

/// Threads the URL and init through every handler in order.
pub(crate) async fn run_before_request(
    handlers: &[BeforeRequestHandler],
    params: FetchParams,
) -> Result<FetchParams, Error> {
    let mut params = params;
    for handler in handlers {
        let (url, init) = params;
        params = handler(url, init).await.map_err(Error::Handler)?;
    }
    Ok(params)
}

/// Offers the transport failure to each handler until one corrects it.
///
/// Returns the correcting response, or the last maintained error.
pub(crate) async fn run_request_error(
    handlers: &[RequestErrorHandler],
    error: RequestError,
    (url, init): &FetchParams,
) -> Result<Response, Error> {
    let mut error = error;
    for (index, handler) in handlers.iter().enumerate() {
        match handler(error, url.clone(), init.clone())
            .await
            .map_err(Error::Handler)?
        {
            ErrorHandlerResult::Corrected(response) => {
                tracing::debug!(
                    handler = index,
                    status = response.status(),
                    "Request error corrected"
                );
                return Ok(response);
            }
            ErrorHandlerResult::Maintained(maintained) => error = maintained,
        }
    }

    tracing::warn!(url = %url, "Request failed: {}", error);
    Err(Error::Request(error))
}

/// Passes the envelope through every handler in order.
pub(crate) async fn run_response_success(
    handlers: &[ResponseSuccessHandler],
    envelope: Envelope,
) -> Result<Envelope, Error> {
    let mut envelope = envelope;
    for handler in handlers {
        envelope = handler(envelope).await.map_err(Error::Handler)?;
    }
    Ok(envelope)
}

/// Offers the response error to each handler until one corrects it.
///
/// A correcting response is read into a fresh envelope and ends the chain.
/// That envelope is returned if its status is in 200-299; otherwise the
/// last maintained error is.
pub(crate) async fn run_response_error(
    handlers: &[ResponseErrorHandler],
    error: ResponseError,
    envelope: Envelope,
    (url, init): &FetchParams,
) -> Result<Envelope, Error> {
    let mut error = error;
    let mut envelope = envelope;
    for (index, handler) in handlers.iter().enumerate() {
        match handler(error.clone(), envelope.clone(), url.clone(), init.clone())
            .await
            .map_err(Error::Handler)?
        {
            ErrorHandlerResult::Corrected(response) => {
                tracing::debug!(
                    handler = index,
                    status = response.status(),
                    "Response error corrected"
                );
                envelope = Envelope::read(response).await?;
                break;
            }
            ErrorHandlerResult::Maintained(maintained) => error = maintained,
        }
    }

    if envelope.ok() {
        return Ok(envelope);
    }

    tracing::warn!(url = %url, status = envelope.status(), "Response error: {}", error);
    Err(Error::Response(error))
}
