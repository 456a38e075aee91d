//! Unified error type.

use crate::config::ConfigError;
use crate::store::StoreError;

/// The error type returned by the wall's fallible startup and serving
/// operations.
///
/// Request-level outcomes (404, a failed write) are expressed as
/// [`Response`](crate::Response) values or log lines, not as `Error`s. This
/// type surfaces the failures that end the process.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
