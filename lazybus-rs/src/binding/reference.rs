//! ListenerRef: the (service key, method) pair naming a lazy listener.

use std::fmt;

use serde_json::Value;

use crate::error::Error;

/// What should run for an event: `method` on the service stored under `service`.
/// Compared by value, so a reference built later matches one registered earlier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerRef {
    service: String,
    method: String,
}

impl ListenerRef {
    /// Both parts must be non-empty.
    pub fn new(service: impl Into<String>, method: impl Into<String>) -> Result<Self, Error> {
        let service = service.into();
        let method = method.into();
        if service.is_empty() || method.is_empty() {
            return Err(Error::InvalidBinding(format!(
                "expected (service, method), got ({service:?}, {method:?})"
            )));
        }
        Ok(Self { service, method })
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn method(&self) -> &str {
        &self.method
    }
}

impl fmt::Display for ListenerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.service, self.method)
    }
}

/// Inputs accepted where a listener reference is expected.
///
/// Anything that is not exactly two non-empty parts fails with `Error::InvalidBinding`.
pub trait IntoListenerRef {
    fn into_listener_ref(self) -> Result<ListenerRef, Error>;
}

impl IntoListenerRef for ListenerRef {
    fn into_listener_ref(self) -> Result<ListenerRef, Error> {
        Ok(self)
    }
}

impl IntoListenerRef for &ListenerRef {
    fn into_listener_ref(self) -> Result<ListenerRef, Error> {
        Ok(self.clone())
    }
}

impl IntoListenerRef for (&str, &str) {
    fn into_listener_ref(self) -> Result<ListenerRef, Error> {
        ListenerRef::new(self.0, self.1)
    }
}

impl IntoListenerRef for (String, String) {
    fn into_listener_ref(self) -> Result<ListenerRef, Error> {
        ListenerRef::new(self.0, self.1)
    }
}

impl IntoListenerRef for &[&str] {
    fn into_listener_ref(self) -> Result<ListenerRef, Error> {
        match self {
            [service, method] => ListenerRef::new(*service, *method),
            other => Err(wrong_arity(other.len())),
        }
    }
}

impl<const N: usize> IntoListenerRef for [&str; N] {
    fn into_listener_ref(self) -> Result<ListenerRef, Error> {
        self.as_slice().into_listener_ref()
    }
}

impl IntoListenerRef for Vec<String> {
    fn into_listener_ref(self) -> Result<ListenerRef, Error> {
        let len = self.len();
        let mut parts = self.into_iter();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(service), Some(method), None) => ListenerRef::new(service, method),
            _ => Err(wrong_arity(len)),
        }
    }
}

/// `"service:method"`; the method is everything after the last colon.
impl IntoListenerRef for &str {
    fn into_listener_ref(self) -> Result<ListenerRef, Error> {
        match self.rsplit_once(':') {
            Some((service, method)) => ListenerRef::new(service, method),
            None => Err(Error::InvalidBinding(format!(
                "expected \"service:method\", got {self:?}"
            ))),
        }
    }
}

/// `["service", "method"]`.
impl IntoListenerRef for &Value {
    fn into_listener_ref(self) -> Result<ListenerRef, Error> {
        match self.as_array().map(Vec::as_slice) {
            Some([Value::String(service), Value::String(method)]) => {
                ListenerRef::new(service.as_str(), method.as_str())
            }
            _ => Err(Error::InvalidBinding(format!(
                "expected [\"service\", \"method\"], got {self}"
            ))),
        }
    }
}

impl IntoListenerRef for Value {
    fn into_listener_ref(self) -> Result<ListenerRef, Error> {
        (&self).into_listener_ref()
    }
}

fn wrong_arity(len: usize) -> Error {
    Error::InvalidBinding(format!("expected [service, method], got {len} element(s)"))
}
