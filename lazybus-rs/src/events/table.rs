//! SubscriberTable: subscriber capability looked up by type name at runtime.

use std::collections::HashMap;

use lazybus_core::{EventSubscriber, SubscribedEvents};

use crate::error::Error;

/// Type names known to declare subscriber bindings, with what they declare.
#[derive(Clone, Debug, Default)]
pub struct SubscriberTable {
    types: HashMap<String, SubscribedEvents>,
}

impl SubscriberTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `S` under `type_name`.
    pub fn register<S: EventSubscriber>(&mut self, type_name: impl Into<String>) -> &mut Self {
        self.types.insert(type_name.into(), S::subscribed_events());
        self
    }

    /// Record a descriptor that has no Rust type behind it (e.g. loaded from JSON).
    pub fn register_descriptor(&mut self, type_name: impl Into<String>, events: SubscribedEvents) -> &mut Self {
        self.types.insert(type_name.into(), events);
        self
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Descriptor of `type_name`, or `Error::NotASubscriber`.
    pub fn get(&self, type_name: &str) -> Result<&SubscribedEvents, Error> {
        self.types
            .get(type_name)
            .ok_or_else(|| Error::NotASubscriber(type_name.to_owned()))
    }
}
