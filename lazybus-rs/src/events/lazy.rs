//! ContainerAwareDispatcher: listeners named by (service key, method), resolved at dispatch time.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use lazybus_core::{
    Container, DispatchError, Dispatcher, Event, EventDispatcher, EventSubscriber, Listener, SharedContainer,
    SubscribedEvents,
};
use tracing::{debug, trace};

use crate::binding::{ContainerSlot, IntoListenerRef, ListenerRef};
use crate::error::Error;
use crate::events::table::SubscriberTable;

/// A listener registered by reference. `listener` is what the wrapped dispatcher holds.
struct LazyBinding {
    reference: ListenerRef,
    listener: Listener,
    priority: i32,
}

/// Dispatcher wrapper that adds listener services on top of `D`.
///
/// A listener service is registered as `(service key, method)`; nothing is constructed until a
/// dispatch reaches it, at which point the key is resolved from the current container and the
/// method called with the event. Every binding resolves through the same `ContainerSlot`, so
/// `set_container` also redirects bindings registered before the swap.
///
/// Everything else (raw listeners, live subscribers, dispatch itself) is passed to `D` unchanged
/// through the `Dispatcher` impl.
pub struct ContainerAwareDispatcher<D: Dispatcher = EventDispatcher> {
    dispatcher: D,
    container: ContainerSlot,
    bindings: HashMap<String, Vec<LazyBinding>>,
    subscriber_types: SubscriberTable,
}

impl<D: Dispatcher> ContainerAwareDispatcher<D> {
    pub fn new(dispatcher: D, container: SharedContainer) -> Self {
        Self {
            dispatcher,
            container: ContainerSlot::new(container),
            bindings: HashMap::new(),
            subscriber_types: SubscriberTable::new(),
        }
    }

    /// Swap the container every listener service resolves from, existing ones included.
    pub fn set_container(&mut self, container: SharedContainer) {
        debug!("replacing container");
        self.container.replace(container);
    }

    pub fn container(&self) -> SharedContainer {
        self.container.current()
    }

    /// The wrapped dispatcher.
    pub fn inner(&self) -> &D {
        &self.dispatcher
    }

    pub fn subscriber_types(&self) -> &SubscriberTable {
        &self.subscriber_types
    }

    /// Table consulted by the `*_subscriber_service_named` methods.
    pub fn subscriber_types_mut(&mut self) -> &mut SubscriberTable {
        &mut self.subscriber_types
    }

    /// Add `reference` as a listener of `event_name`. Registering the same reference twice adds it twice.
    ///
    /// Fails with `Error::InvalidBinding` before anything is registered if `reference` is not
    /// a (service key, method) pair.
    pub fn add_listener_service<R: IntoListenerRef>(
        &mut self,
        event_name: &str,
        reference: R,
        priority: i32,
    ) -> Result<(), Error> {
        let reference = reference.into_listener_ref()?;
        self.bind(event_name, reference, priority);
        Ok(())
    }

    /// Remove the first binding of `reference` on `event_name`, whatever its priority.
    /// Later duplicates stay registered. Unknown references are ignored.
    pub fn remove_listener_service<R: IntoListenerRef>(&mut self, event_name: &str, reference: R) -> Result<(), Error> {
        let reference = reference.into_listener_ref()?;
        self.unbind(event_name, &reference);
        Ok(())
    }

    /// Register every binding `S` declares, against the service stored under `service_key`.
    pub fn add_subscriber_service<S: EventSubscriber>(&mut self, service_key: &str) -> Result<(), Error> {
        self.expand(service_key, &S::subscribed_events())
    }

    /// Like `add_subscriber_service`, with the subscriber type named at runtime.
    /// Fails with `Error::NotASubscriber` if `type_name` is not in the subscriber table.
    pub fn add_subscriber_service_named(&mut self, service_key: &str, type_name: &str) -> Result<(), Error> {
        let events = self.subscriber_types.get(type_name)?.clone();
        self.expand(service_key, &events)
    }

    /// Undo `add_subscriber_service` for the same service key.
    pub fn remove_subscriber_service<S: EventSubscriber>(&mut self, service_key: &str) -> Result<(), Error> {
        self.contract(service_key, &S::subscribed_events())
    }

    pub fn remove_subscriber_service_named(&mut self, service_key: &str, type_name: &str) -> Result<(), Error> {
        let events = self.subscriber_types.get(type_name)?.clone();
        self.contract(service_key, &events)
    }

    /// Listener services of `event_name` with their priorities, in registration order.
    pub fn service_listeners(&self, event_name: &str) -> Vec<(ListenerRef, i32)> {
        self.bindings
            .get(event_name)
            .map(|bindings| {
                bindings
                    .iter()
                    .map(|b| (b.reference.clone(), b.priority))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn bind(&mut self, event_name: &str, reference: ListenerRef, priority: i32) {
        debug!(event = event_name, %reference, priority, "adding listener service");
        let listener = lazy_listener(self.container.clone(), reference.clone());
        self.dispatcher.add_listener(event_name, listener.clone(), priority);
        self.bindings
            .entry(event_name.to_owned())
            .or_default()
            .push(LazyBinding {
                reference,
                listener,
                priority,
            });
    }

    fn unbind(&mut self, event_name: &str, reference: &ListenerRef) {
        let Some(bindings) = self.bindings.get_mut(event_name) else {
            return;
        };
        let Some(pos) = bindings.iter().position(|b| &b.reference == reference) else {
            return;
        };
        let binding = bindings.remove(pos);
        if bindings.is_empty() {
            self.bindings.remove(event_name);
        }
        debug!(event = event_name, %reference, priority = binding.priority, "removing listener service");
        self.dispatcher.remove_listener(event_name, &binding.listener);
    }

    fn expand(&mut self, service_key: &str, events: &SubscribedEvents) -> Result<(), Error> {
        let planned = plan(service_key, events)?;
        debug!(service = service_key, bindings = planned.len(), "adding subscriber service");
        for (event_name, reference, priority) in planned {
            self.bind(event_name, reference, priority);
        }
        Ok(())
    }

    fn contract(&mut self, service_key: &str, events: &SubscribedEvents) -> Result<(), Error> {
        let planned = plan(service_key, events)?;
        debug!(service = service_key, bindings = planned.len(), "removing subscriber service");
        for (event_name, reference, _) in planned {
            self.unbind(event_name, &reference);
        }
        Ok(())
    }
}

impl Default for ContainerAwareDispatcher<EventDispatcher> {
    fn default() -> Self {
        Self::new(EventDispatcher::new(), Container::new().shared())
    }
}

impl<D: Dispatcher> Dispatcher for ContainerAwareDispatcher<D> {
    fn dispatch(&self, event_name: &str, event: Event) -> Result<Event, DispatchError> {
        self.dispatcher.dispatch(event_name, event)
    }

    fn add_listener(&mut self, event_name: &str, listener: Listener, priority: i32) {
        self.dispatcher.add_listener(event_name, listener, priority);
    }

    /// Also forgets the binding if `listener` came from a listener service.
    fn remove_listener(&mut self, event_name: &str, listener: &Listener) {
        if let Some(bindings) = self.bindings.get_mut(event_name) {
            bindings.retain(|b| &b.listener != listener);
            if bindings.is_empty() {
                self.bindings.remove(event_name);
            }
        }
        self.dispatcher.remove_listener(event_name, listener);
    }

    fn listeners(&self, event_name: &str) -> Vec<Listener> {
        self.dispatcher.listeners(event_name)
    }

    fn all_listeners(&self) -> BTreeMap<String, Vec<Listener>> {
        self.dispatcher.all_listeners()
    }

    fn has_listeners(&self, event_name: Option<&str>) -> bool {
        self.dispatcher.has_listeners(event_name)
    }

    fn add_subscriber<S: EventSubscriber>(&mut self, subscriber: Arc<S>) {
        self.dispatcher.add_subscriber(subscriber);
    }

    fn remove_subscriber<S: EventSubscriber>(&mut self, subscriber: &Arc<S>) {
        self.dispatcher.remove_subscriber(subscriber);
    }
}

/// Validate every binding of `events` before any is registered.
fn plan<'a>(service_key: &str, events: &'a SubscribedEvents) -> Result<Vec<(&'a str, ListenerRef, i32)>, Error> {
    events
        .bindings()
        .into_iter()
        .map(|(event_name, method, priority)| {
            ListenerRef::new(service_key, method).map(|reference| (event_name, reference, priority))
        })
        .collect()
}

fn lazy_listener(slot: ContainerSlot, reference: ListenerRef) -> Listener {
    Listener::new(move |event: &mut Event| {
        trace!(%reference, "calling listener service");
        let service = slot.resolve(reference.service())?;
        service.call(reference.method(), event)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazybus_core::Service;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Tape(Mutex<String>);

    impl Service for Tape {
        fn call(&self, method: &str, _event: &mut Event) -> Result<(), DispatchError> {
            self.0.lock().unwrap().push_str(method);
            Ok(())
        }
    }

    fn dispatcher_with_tape() -> (ContainerAwareDispatcher, SharedContainer) {
        let mut container = Container::new();
        container.register_factory_with_key("tape", |_| Tape::default());
        let container = container.shared();
        (ContainerAwareDispatcher::new(EventDispatcher::new(), Arc::clone(&container)), container)
    }

    fn tape(container: &SharedContainer) -> String {
        let tape = container.lock().unwrap().resolve_by_key::<Tape>("tape").unwrap();
        let text = tape.0.lock().unwrap().clone();
        text
    }

    #[test]
    fn registry_tracks_bindings_per_event() {
        let (mut d, _) = dispatcher_with_tape();
        d.add_listener_service("foo", ("tape", "a"), 5).unwrap();
        d.add_listener_service("foo", ("tape", "b"), 0).unwrap();
        d.add_listener_service("foo", ("tape", "a"), 1).unwrap();
        assert_eq!(
            d.service_listeners("foo"),
            vec![
                (ListenerRef::new("tape", "a").unwrap(), 5),
                (ListenerRef::new("tape", "b").unwrap(), 0),
                (ListenerRef::new("tape", "a").unwrap(), 1),
            ]
        );
        assert_eq!(d.listeners("foo").len(), 3);

        d.remove_listener_service("foo", ("tape", "a")).unwrap();
        assert_eq!(
            d.service_listeners("foo"),
            vec![
                (ListenerRef::new("tape", "b").unwrap(), 0),
                (ListenerRef::new("tape", "a").unwrap(), 1),
            ]
        );
        assert_eq!(d.listeners("foo").len(), 2);
    }

    #[test]
    fn raw_removal_of_a_lazy_listener_forgets_the_binding() {
        let (mut d, container) = dispatcher_with_tape();
        d.add_listener_service("foo", ("tape", "a"), 0).unwrap();
        let raw = d.listeners("foo").remove(0);
        d.remove_listener("foo", &raw);
        assert!(d.service_listeners("foo").is_empty());
        assert!(!d.has_listeners(Some("foo")));
        d.dispatch("foo", Event::default()).unwrap();
        assert_eq!(tape(&container), "");
    }

    #[test]
    fn inner_dispatcher_holds_the_lazy_listeners() {
        let (mut d, _) = dispatcher_with_tape();
        d.add_listener_service("foo", ("tape", "a"), 0).unwrap();
        assert!(d.inner().has_listeners(Some("foo")));
        assert_eq!(d.inner().listeners("foo"), d.listeners("foo"));
    }

    #[test]
    fn subscriber_types_are_shared_with_named_lookups() {
        let (mut d, _) = dispatcher_with_tape();
        assert!(!d.subscriber_types().contains("Tape"));
        d.subscriber_types_mut()
            .register_descriptor("Tape", SubscribedEvents::new().method("foo", "a"));
        assert!(d.subscriber_types().contains("Tape"));
        d.add_subscriber_service_named("tape", "Tape").unwrap();
        assert_eq!(d.service_listeners("foo"), vec![(ListenerRef::new("tape", "a").unwrap(), 0)]);
    }

    #[test]
    fn invalid_subscriber_method_registers_nothing() {
        let (mut d, _) = dispatcher_with_tape();
        d.subscriber_types_mut().register_descriptor(
            "Broken",
            SubscribedEvents::new().method("foo", "a").method("bar", ""),
        );
        let err = d.add_subscriber_service_named("tape", "Broken").unwrap_err();
        assert!(matches!(err, Error::InvalidBinding(_)));
        assert!(!d.has_listeners(None));
    }
}
