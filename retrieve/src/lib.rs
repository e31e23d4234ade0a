//! A single-shot HTTP request pipeline with pluggable interceptors.
//!
//! [`retrieve`] builds the URL and init from a [`RetrieveConfig`], sends the
//! request through a [`Transport`], deserializes the response body by its
//! content type and hands the result to the configured handler chains.

mod body;
mod errors;
pub mod handler;
mod pipeline;
mod request;
mod transport;
pub mod types;
pub use self::body::{
    BodyType, CONTENT_TYPE_FORM_DATA, CONTENT_TYPE_JSON, CONTENT_TYPE_JSON_PROBLEM,
    CONTENT_TYPE_OCTET_STREAM, CONTENT_TYPE_TEXT,
};
pub use self::errors::{AbortError, BodyError, BoxError, Error, RequestError, ResponseError};
pub use self::handler::{ErrorHandlerResult, FetchParams, HandlerResult};
pub use self::pipeline::{retrieve, retrieve_with};
pub use self::request::{build_init, build_url};
pub use self::transport::{ReqwestTransport, Transport};
pub use self::types::{
    AbortController, AbortSignal, Blob, Envelope, FormData, FormValue, HeadersInit, Init, Payload,
    RedirectMode, RequestInit, Response, ResponseData, RetrieveConfig,
};
