//! lazybus core: event dispatcher, keyed service container, subscriber descriptors.

pub mod container;
pub mod dispatcher;
pub mod event;
pub mod into_dispatch_error;
pub mod listener;
pub mod provider;
pub mod subscriber;

pub use container::{Container, ContainerError, SharedContainer};
pub use dispatcher::{Dispatcher, EventDispatcher};
pub use event::Event;
pub use into_dispatch_error::IntoDispatchError;
pub use listener::{AsAnyArc, Listener, ListenerFn, ListenerOutcome, Service};
pub use provider::ServiceProvider;
pub use subscriber::{EventSubscriber, ListenerMethod, SubscribedEvents, Subscription};

use thiserror::Error;

/// Failure raised while a dispatch runs its listeners. Returned unchanged by `dispatch`.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error("service {service} has no listener method {method:?}")]
    UnknownMethod { service: String, method: String },
    #[error("listener failed: {0}")]
    Listener(Box<dyn std::error::Error + Send + Sync>),
}

impl DispatchError {
    /// Error for `Service::call` when `method` is not one the service answers to.
    pub fn unknown_method(service: &str, method: &str) -> Self {
        DispatchError::UnknownMethod {
            service: service.to_owned(),
            method: method.to_owned(),
        }
    }
}
