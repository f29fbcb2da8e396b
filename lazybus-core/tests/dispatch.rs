//! Dispatcher and container used together without the lazy adapter.

use std::sync::{Arc, Mutex};

use lazybus_core::{
    Container, DispatchError, Dispatcher, Event, EventDispatcher, EventSubscriber, IntoDispatchError, Listener,
    Service, SubscribedEvents,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[ctor::ctor]
fn init_tests() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

#[derive(Default)]
struct Inventory {
    stock: Mutex<i64>,
}

impl Inventory {
    fn on_received(&self, event: &mut Event) -> Result<(), DispatchError> {
        let qty = event.payload()["qty"].as_i64().unwrap_or(0);
        *self.stock.lock().unwrap() += qty;
        Ok(())
    }

    fn on_shipped(&self, event: &mut Event) -> Result<(), DispatchError> {
        let qty: i64 = event.payload()["qty"]
            .as_str()
            .unwrap_or("0")
            .parse()
            .map_err(IntoDispatchError::into_dispatch_error)?;
        *self.stock.lock().unwrap() -= qty;
        Ok(())
    }
}

impl Service for Inventory {
    fn call(&self, method: &str, event: &mut Event) -> Result<(), DispatchError> {
        match method {
            "on_received" => self.on_received(event),
            "on_shipped" => self.on_shipped(event),
            _ => Err(DispatchError::unknown_method(self.service_name(), method)),
        }
    }
}

impl EventSubscriber for Inventory {
    fn subscribed_events() -> SubscribedEvents {
        SubscribedEvents::new()
            .method("received", "on_received")
            .method("shipped", "on_shipped")
    }
}

#[test]
fn container_resolved_instance_as_subscriber() {
    let mut container = Container::new();
    container.register_factory_with_key("inventory", |_| Inventory::default());
    let inventory = container.resolve_by_key::<Inventory>("inventory").unwrap();

    let mut d = EventDispatcher::new();
    d.add_subscriber(Arc::clone(&inventory));
    d.dispatch("received", Event::new(json!({ "qty": 7 }))).unwrap();
    d.dispatch("shipped", Event::new(json!({ "qty": "3" }))).unwrap();
    assert_eq!(*inventory.stock.lock().unwrap(), 4);

    let err = d.dispatch("shipped", Event::new(json!({ "qty": "many" }))).unwrap_err();
    assert!(matches!(err, DispatchError::Listener(_)));
    assert_eq!(*inventory.stock.lock().unwrap(), 4);
}

#[test]
fn raw_and_method_listeners_share_priorities() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let inventory = Arc::new(Inventory::default());
    let mut d = EventDispatcher::new();
    let before = Arc::clone(&log);
    d.add_listener(
        "received",
        Listener::new(move |e| {
            before.lock().unwrap().push(e.payload()["qty"].clone());
            Ok(())
        }),
        1,
    );
    d.add_listener("received", Listener::method(inventory.clone(), "on_received"), 0);
    d.dispatch("received", Event::new(json!({ "qty": 2 }))).unwrap();
    assert_eq!(*log.lock().unwrap(), vec![json!(2)]);
    assert_eq!(*inventory.stock.lock().unwrap(), 2);
    assert_eq!(d.listeners("received").len(), 2);
}
