//! Keyed service container: instances, shared (lazy, once) and transient factories.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::trace;

use crate::listener::Service;
use crate::provider::ServiceProvider;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("no service registered under {0:?}")]
    NotFound(String),
    #[error("service {key:?} is not a {expected}")]
    TypeMismatch { key: String, expected: &'static str },
}

/// Container shared between the code that fills it and the listeners resolving from it.
pub type SharedContainer = Arc<Mutex<Container>>;

type FactoryFn = Box<dyn Fn(&mut Container) -> Arc<dyn Service> + Send + Sync>;

enum Entry {
    Ready(Arc<dyn Service>),
    Shared(FactoryFn),
    Transient(FactoryFn),
}

/// Keyed service container. Shared factories run on first resolution and the instance is kept;
/// transient factories run on every resolution.
#[derive(Default)]
pub struct Container {
    entries: HashMap<String, Entry>,
}

impl Container {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Wrap into the handle shape listeners resolve through.
    pub fn shared(self) -> SharedContainer {
        Arc::new(Mutex::new(self))
    }

    /// Register a ready-made instance under `key`.
    pub fn register_instance_with_key<K: Into<String>, T: Service>(&mut self, key: K, value: T) {
        self.entries.insert(key.into(), Entry::Ready(Arc::new(value)));
    }

    /// Register a shared service: `f` runs once, on first resolution.
    pub fn register_factory_with_key<K, T, F>(&mut self, key: K, f: F)
    where
        K: Into<String>,
        T: Service,
        F: Fn(&mut Container) -> T + Send + Sync + 'static,
    {
        self.entries.insert(key.into(), Entry::Shared(erase(f)));
    }

    /// Register a transient service: `f` runs on every resolution.
    pub fn register_transient_with_key<K, T, F>(&mut self, key: K, f: F)
    where
        K: Into<String>,
        T: Service,
        F: Fn(&mut Container) -> T + Send + Sync + 'static,
    {
        self.entries.insert(key.into(), Entry::Transient(erase(f)));
    }

    /// Let `provider` register its services.
    pub fn register<P: ServiceProvider + ?Sized>(&mut self, provider: &mut P) -> Result<(), ContainerError> {
        provider.register_into(self)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// True once `key` holds a constructed instance (never for transient services).
    pub fn is_resolved(&self, key: &str) -> bool {
        matches!(self.entries.get(key), Some(Entry::Ready(_)))
    }

    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Resolve `key`, constructing it if needed.
    pub fn resolve_service(&mut self, key: &str) -> Result<Arc<dyn Service>, ContainerError> {
        let entry = self
            .entries
            .remove(key)
            .ok_or_else(|| ContainerError::NotFound(key.to_owned()))?;
        let (service, entry) = match entry {
            Entry::Ready(service) => (Arc::clone(&service), Entry::Ready(service)),
            Entry::Shared(factory) => {
                trace!(key, "constructing shared service");
                let service = factory(self);
                (Arc::clone(&service), Entry::Ready(service))
            }
            Entry::Transient(factory) => {
                trace!(key, "constructing transient service");
                let service = factory(self);
                (service, Entry::Transient(factory))
            }
        };
        // A factory may have registered the key itself; keep that registration.
        self.entries.entry(key.to_owned()).or_insert(entry);
        Ok(service)
    }

    /// Resolve `key` as a concrete type.
    pub fn resolve_by_key<T: Service>(&mut self, key: &str) -> Result<Arc<T>, ContainerError> {
        self.resolve_service(key)?
            .into_any_arc()
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch {
                key: key.to_owned(),
                expected: std::any::type_name::<T>(),
            })
    }
}

fn erase<T, F>(f: F) -> FactoryFn
where
    T: Service,
    F: Fn(&mut Container) -> T + Send + Sync + 'static,
{
    Box::new(move |c: &mut Container| Arc::new(f(c)) as Arc<dyn Service>)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter(usize);
    impl Service for Counter {}

    struct Greeting(&'static str);
    impl Service for Greeting {}

    #[test]
    fn shared_factory_runs_once() {
        let built = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&built);
        let mut c = Container::new();
        c.register_factory_with_key("counter", move |_| Counter(seen.fetch_add(1, Ordering::SeqCst)));
        assert!(c.contains("counter"));
        assert!(!c.is_resolved("counter"));

        let first = c.resolve_by_key::<Counter>("counter").unwrap();
        let second = c.resolve_by_key::<Counter>("counter").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(c.is_resolved("counter"));
        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn transient_factory_runs_every_time() {
        let built = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&built);
        let mut c = Container::new();
        c.register_transient_with_key("counter", move |_| Counter(seen.fetch_add(1, Ordering::SeqCst)));
        let first = c.resolve_by_key::<Counter>("counter").unwrap();
        let second = c.resolve_by_key::<Counter>("counter").unwrap();
        assert_eq!((first.0, second.0), (0, 1));
        assert!(!c.is_resolved("counter"));
    }

    #[test]
    fn factories_can_resolve_dependencies() {
        let mut c = Container::new();
        c.register_instance_with_key("greeting", Greeting("hello"));
        c.register_factory_with_key("counter", |c: &mut Container| {
            let greeting = c.resolve_by_key::<Greeting>("greeting").map(|g| g.0.len()).unwrap_or(0);
            Counter(greeting)
        });
        assert_eq!(c.resolve_by_key::<Counter>("counter").unwrap().0, 5);
    }

    #[test]
    fn missing_and_mistyped_keys() {
        let mut c = Container::new();
        c.register_instance_with_key("greeting", Greeting("hi"));
        assert!(matches!(c.resolve_service("nope"), Err(ContainerError::NotFound(k)) if k == "nope"));
        assert!(matches!(
            c.resolve_by_key::<Counter>("greeting"),
            Err(ContainerError::TypeMismatch { .. })
        ));
        // A failed downcast leaves the entry in place.
        assert_eq!(c.resolve_by_key::<Greeting>("greeting").unwrap().0, "hi");
        assert_eq!(c.keys(), vec!["greeting"]);
    }
}
