//! Listeners and the `Service` trait that lets the container call methods by name.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::event::Event;
use crate::DispatchError;

/// Callable form of a listener.
pub type ListenerFn = dyn Fn(&mut Event) -> Result<(), DispatchError> + Send + Sync;

/// Turn an `Arc<dyn Service>` back into `Arc<dyn Any>` for downcasting. Implemented for every sized type.
pub trait AsAnyArc {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAnyArc for T {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Anything stored in a `Container`. Listener methods are looked up by name through `call`;
/// use `#[listener_methods]` on an impl block to generate it.
pub trait Service: AsAnyArc + Send + Sync + 'static {
    /// Invoke the listener method `method` with `event`.
    fn call(&self, method: &str, _event: &mut Event) -> Result<(), DispatchError> {
        Err(DispatchError::unknown_method(self.service_name(), method))
    }

    fn service_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Return types accepted from listener methods: `()` or `Result<(), DispatchError>`.
pub trait ListenerOutcome {
    fn into_outcome(self) -> Result<(), DispatchError>;
}

impl ListenerOutcome for () {
    fn into_outcome(self) -> Result<(), DispatchError> {
        Ok(())
    }
}

impl ListenerOutcome for Result<(), DispatchError> {
    fn into_outcome(self) -> Result<(), DispatchError> {
        self
    }
}

/// Listener registered with a dispatcher.
///
/// Equality is identity: two callbacks are equal when they share the same allocation,
/// two method listeners when they target the same instance and method.
#[derive(Clone)]
pub enum Listener {
    Callback(Arc<ListenerFn>),
    Method { target: Arc<dyn Service>, method: String },
}

impl Listener {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Event) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        Listener::Callback(Arc::new(f))
    }

    pub fn method(target: Arc<dyn Service>, method: impl Into<String>) -> Self {
        Listener::Method {
            target,
            method: method.into(),
        }
    }

    pub fn call(&self, event: &mut Event) -> Result<(), DispatchError> {
        match self {
            Listener::Callback(f) => f(event),
            Listener::Method { target, method } => target.call(method, event),
        }
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Listener::Callback(a), Listener::Callback(b)) => Arc::ptr_eq(a, b),
            (
                Listener::Method { target: a, method: m },
                Listener::Method { target: b, method: n },
            ) => Arc::ptr_eq(a, b) && m == n,
            _ => false,
        }
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Listener::Callback(cb) => write!(f, "Callback({:p})", Arc::as_ptr(cb)),
            Listener::Method { target, method } => {
                write!(f, "Method({}::{})", target.service_name(), method)
            }
        }
    }
}
