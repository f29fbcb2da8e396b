//! lazybus for Rust: event dispatch with listener services resolved lazily from a container.

pub mod binding;
pub mod error;
pub mod events;

pub use binding::{ContainerSlot, IntoListenerRef, ListenerRef};
pub use error::Error;
pub use events::{ContainerAwareDispatcher, SubscriberTable};
pub use lazybus_core::{
    AsAnyArc, Container, ContainerError, DispatchError, Dispatcher, Event, EventDispatcher, EventSubscriber,
    IntoDispatchError, Listener, ListenerMethod, ListenerOutcome, Service, ServiceProvider, SharedContainer,
    SubscribedEvents, Subscription,
};
pub use lazybus_rs_macros::listener_methods;
