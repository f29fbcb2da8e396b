#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use lazybus_rs::{listener_methods, Container, DispatchError, Event, EventSubscriber, SharedContainer, SubscribedEvents};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[ctor::ctor]
fn init_tests() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

pub const FOO_SERVICE: &str = "foo.service";

/// Appends a fragment per listener call.
#[derive(Default)]
pub struct FooService {
    pub string: Mutex<String>,
}

#[listener_methods]
impl FooService {
    #[listener]
    pub fn on_foo(&self, _event: &mut Event) {
        self.push("foo");
    }

    #[listener]
    pub fn on_bar1(&self, _event: &mut Event) {
        self.push("bar1");
    }

    #[listener]
    pub fn on_bar2(&self, _event: &mut Event) {
        self.push("bar2");
    }

    #[listener]
    pub fn on_buzz(&self, _event: &mut Event) {
        self.push("buzz");
    }

    /// Appends the payload's `text` field.
    #[listener]
    pub fn on_payload(&self, event: &mut Event) -> Result<(), DispatchError> {
        let text = event.payload()["text"].as_str().unwrap_or_default().to_owned();
        self.push(&text);
        Ok(())
    }

    pub fn text(&self) -> String {
        self.string.lock().unwrap().clone()
    }

    fn push(&self, fragment: &str) {
        self.string.lock().unwrap().push_str(fragment);
    }
}

impl EventSubscriber for FooService {
    fn subscribed_events() -> SubscribedEvents {
        SubscribedEvents::new()
            .method("foo", "on_foo")
            .many("bar", [("on_bar1", None), ("on_bar2", Some(10))])
            .with_priority("buzz", "on_buzz", 5)
    }
}

/// Container with `foo.service` as a shared, lazily built `FooService`.
/// The counter tracks how many instances were built.
pub fn foo_container() -> (SharedContainer, Arc<AtomicUsize>) {
    let built = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&built);
    let mut container = Container::new();
    container.register_factory_with_key(FOO_SERVICE, move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
        FooService::default()
    });
    (container.shared(), built)
}

/// Text accumulated by `foo.service` in `container` (builds it if nothing has yet).
pub fn foo_text(container: &SharedContainer) -> String {
    let service = container
        .lock()
        .unwrap()
        .resolve_by_key::<FooService>(FOO_SERVICE)
        .unwrap();
    service.text()
}
