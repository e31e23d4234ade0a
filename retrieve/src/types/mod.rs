mod config;
pub use self::config::RetrieveConfig;

mod init;
pub use self::init::{HeadersInit, Init, RedirectMode, RequestInit};

mod payload;
pub use self::payload::{Blob, FormData, FormValue, Payload};

mod response;
pub use self::response::{Envelope, Response, ResponseData};

mod signal;
pub use self::signal::{AbortController, AbortSignal};
