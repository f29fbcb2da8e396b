//! Subscriber descriptors: which methods of a service listen to which events.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::listener::Service;

/// Service that declares its own event bindings.
pub trait EventSubscriber: Service {
    fn subscribed_events() -> SubscribedEvents
    where
        Self: Sized;
}

/// One method binding with an optional priority (0 when omitted).
///
/// Deserializes from `["method"]` or `["method", priority]`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "RawListenerMethod")]
pub struct ListenerMethod {
    pub method: String,
    pub priority: Option<i32>,
}

impl ListenerMethod {
    pub fn new(method: impl Into<String>, priority: Option<i32>) -> Self {
        Self {
            method: method.into(),
            priority,
        }
    }

    pub fn priority(&self) -> i32 {
        self.priority.unwrap_or(0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawListenerMethod {
    WithPriority((String, i32)),
    Bare((String,)),
}

impl From<RawListenerMethod> for ListenerMethod {
    fn from(raw: RawListenerMethod) -> Self {
        match raw {
            RawListenerMethod::WithPriority((method, priority)) => ListenerMethod::new(method, Some(priority)),
            RawListenerMethod::Bare((method,)) => ListenerMethod::new(method, None),
        }
    }
}

/// What a subscriber declares for one event.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Subscription {
    /// `"on_foo"`: one binding at priority 0.
    Method(String),
    /// `["on_buzz", 5]`: one binding.
    Single(ListenerMethod),
    /// `[["on_bar1"], ["on_bar2", 10]]`: one binding per entry, in order.
    Many(Vec<ListenerMethod>),
}

impl Subscription {
    fn methods(&self) -> Vec<(&str, i32)> {
        match self {
            Subscription::Method(method) => vec![(method.as_str(), 0)],
            Subscription::Single(m) => vec![(m.method.as_str(), m.priority())],
            Subscription::Many(list) => list.iter().map(|m| (m.method.as_str(), m.priority())).collect(),
        }
    }
}

/// Event name -> subscription, in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubscribedEvents {
    entries: Vec<(String, Subscription)>,
}

impl SubscribedEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// `event => "method"`.
    pub fn method(self, event: &str, method: &str) -> Self {
        self.on(event, Subscription::Method(method.to_owned()))
    }

    /// `event => ["method", priority]`.
    pub fn with_priority(self, event: &str, method: &str, priority: i32) -> Self {
        self.on(event, Subscription::Single(ListenerMethod::new(method, Some(priority))))
    }

    /// `event => [["method"], ["method", priority], ...]`.
    pub fn many<'a, I>(self, event: &str, methods: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Option<i32>)>,
    {
        let list = methods
            .into_iter()
            .map(|(method, priority)| ListenerMethod::new(method, priority))
            .collect();
        self.on(event, Subscription::Many(list))
    }

    /// Declare `subscription` for `event`. A later declaration for the same event replaces the earlier one.
    pub fn on(mut self, event: &str, subscription: Subscription) -> Self {
        match self.entries.iter_mut().find(|(name, _)| name == event) {
            Some(entry) => entry.1 = subscription,
            None => self.entries.push((event.to_owned(), subscription)),
        }
        self
    }

    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, event: &str) -> Option<&Subscription> {
        self.entries
            .iter()
            .find(|(name, _)| name == event)
            .map(|(_, subscription)| subscription)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flattened `(event, method, priority)` triples in declaration order.
    pub fn bindings(&self) -> Vec<(&str, &str, i32)> {
        self.entries
            .iter()
            .flat_map(|(event, subscription)| {
                subscription
                    .methods()
                    .into_iter()
                    .map(move |(method, priority)| (event.as_str(), method, priority))
            })
            .collect()
    }
}

impl<'de> Deserialize<'de> for SubscribedEvents {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EventsVisitor;

        impl<'de> Visitor<'de> for EventsVisitor {
            type Value = SubscribedEvents;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of event name to method, [method, priority] or list of those")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut events = SubscribedEvents::new();
                while let Some((event, subscription)) = map.next_entry::<String, Subscription>()? {
                    events = events.on(&event, subscription);
                }
                Ok(events)
            }
        }

        deserializer.deserialize_map(EventsVisitor)
    }
}

impl TryFrom<serde_json::Value> for SubscribedEvents {
    type Error = serde_json::Error;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        serde_json::from_value(value)
    }
}
