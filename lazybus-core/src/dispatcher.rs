//! Priority-ordered event dispatcher operating on raw listeners.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::event::Event;
use crate::listener::{Listener, Service};
use crate::subscriber::EventSubscriber;
use crate::DispatchError;

/// Priority-ordered pub/sub. Higher priorities run first; equal priorities run in registration order.
pub trait Dispatcher {
    /// Call every listener of `event_name` until one fails or propagation is stopped.
    fn dispatch(&self, event_name: &str, event: Event) -> Result<Event, DispatchError>;

    fn add_listener(&mut self, event_name: &str, listener: Listener, priority: i32);

    /// Remove `listener` from `event_name`. Unknown listeners are ignored.
    fn remove_listener(&mut self, event_name: &str, listener: &Listener);

    /// Listeners of `event_name` in call order.
    fn listeners(&self, event_name: &str) -> Vec<Listener>;

    /// Listeners of every event that has any, in call order.
    fn all_listeners(&self) -> BTreeMap<String, Vec<Listener>>;

    /// Whether `event_name` (or, with `None`, any event) has listeners.
    fn has_listeners(&self, event_name: Option<&str>) -> bool;

    /// Register every binding `S` declares, on this live instance.
    fn add_subscriber<S: EventSubscriber>(&mut self, subscriber: Arc<S>)
    where
        Self: Sized,
    {
        let target: Arc<dyn Service> = subscriber;
        let events = S::subscribed_events();
        for (event_name, method, priority) in events.bindings() {
            self.add_listener(event_name, Listener::method(Arc::clone(&target), method), priority);
        }
    }

    /// Undo `add_subscriber` for the same instance.
    fn remove_subscriber<S: EventSubscriber>(&mut self, subscriber: &Arc<S>)
    where
        Self: Sized,
    {
        let target: Arc<dyn Service> = Arc::clone(subscriber) as Arc<dyn Service>;
        let events = S::subscribed_events();
        for (event_name, method, _) in events.bindings() {
            self.remove_listener(event_name, &Listener::method(Arc::clone(&target), method));
        }
    }
}

/// In-process dispatcher: event name -> priority -> listeners.
#[derive(Default)]
pub struct EventDispatcher {
    listeners: HashMap<String, BTreeMap<i32, Vec<Listener>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
        }
    }
}

impl Dispatcher for EventDispatcher {
    fn dispatch(&self, event_name: &str, mut event: Event) -> Result<Event, DispatchError> {
        event.set_name(event_name);
        let Some(buckets) = self.listeners.get(event_name) else {
            trace!(event = event_name, "no listeners");
            return Ok(event);
        };
        for listener in buckets.values().rev().flatten() {
            trace!(event = event_name, ?listener, "calling listener");
            listener.call(&mut event)?;
            if event.is_propagation_stopped() {
                debug!(event = event_name, "propagation stopped");
                break;
            }
        }
        Ok(event)
    }

    fn add_listener(&mut self, event_name: &str, listener: Listener, priority: i32) {
        debug!(event = event_name, priority, ?listener, "adding listener");
        self.listeners
            .entry(event_name.to_owned())
            .or_default()
            .entry(priority)
            .or_default()
            .push(listener);
    }

    fn remove_listener(&mut self, event_name: &str, listener: &Listener) {
        let Some(buckets) = self.listeners.get_mut(event_name) else {
            return;
        };
        for bucket in buckets.values_mut() {
            if let Some(pos) = bucket.iter().position(|l| l == listener) {
                debug!(event = event_name, ?listener, "removing listener");
                bucket.remove(pos);
            }
        }
        buckets.retain(|_, bucket| !bucket.is_empty());
        if buckets.is_empty() {
            self.listeners.remove(event_name);
        }
    }

    fn listeners(&self, event_name: &str) -> Vec<Listener> {
        self.listeners
            .get(event_name)
            .map(|buckets| buckets.values().rev().flatten().cloned().collect())
            .unwrap_or_default()
    }

    fn all_listeners(&self) -> BTreeMap<String, Vec<Listener>> {
        self.listeners
            .keys()
            .map(|name| (name.clone(), self.listeners(name)))
            .collect()
    }

    fn has_listeners(&self, event_name: Option<&str>) -> bool {
        match event_name {
            Some(name) => self.listeners.contains_key(name),
            None => !self.listeners.is_empty(),
        }
    }
}
