//! Errors raised by the container-aware dispatcher.

use std::path::PathBuf;

use lazybus_core::DispatchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Listener reference that is not exactly a (service key, method) pair.
    #[error("invalid listener binding: {0}")]
    InvalidBinding(String),
    /// Type name with no entry in the subscriber table.
    #[error("{0} is not a registered event subscriber")]
    NotASubscriber(String),
    #[error("invalid subscriber descriptor: {0}")]
    InvalidDescriptor(String),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidDescriptor(e.to_string())
    }
}
