//! Builds the outbound URL and init from a [`RetrieveConfig`](crate::RetrieveConfig).

mod init;
pub use self::init::build_init;

mod target;
pub use self::target::build_url;
