//! Map custom errors to DispatchError in listener methods without writing the boxing by hand.

use crate::DispatchError;

/// Convert any error to DispatchError. Use in listeners: `.map_err(IntoDispatchError::into_dispatch_error)?`.
pub trait IntoDispatchError {
    fn into_dispatch_error(self) -> DispatchError;
}

impl<E: std::error::Error + Send + Sync + 'static> IntoDispatchError for E {
    fn into_dispatch_error(self) -> DispatchError {
        DispatchError::Listener(Box::new(self))
    }
}
