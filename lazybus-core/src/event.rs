//! Event passed through a dispatch: JSON payload plus propagation state.

use serde_json::Value;

/// Event handed to every listener of a dispatch. The dispatcher sets the name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Event {
    name: Option<String>,
    payload: Value,
    propagation_stopped: bool,
}

impl Event {
    pub fn new(payload: Value) -> Self {
        Self {
            name: None,
            payload,
            propagation_stopped: false,
        }
    }

    /// Name of the event this instance is being dispatched as, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_owned());
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut Value {
        &mut self.payload
    }

    pub fn into_payload(self) -> Value {
        self.payload
    }

    /// Listeners with a lower priority than the current one are not called.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

impl From<Value> for Event {
    fn from(payload: Value) -> Self {
        Event::new(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_round_trips_through_the_event() {
        let mut event = Event::from(json!({ "id": 7 }));
        assert_eq!(event.name(), None);
        assert!(!event.is_propagation_stopped());
        event.payload_mut()["seen"] = json!(true);
        event.stop_propagation();
        assert!(event.is_propagation_stopped());
        assert_eq!(event.into_payload(), json!({ "id": 7, "seen": true }));
    }

    #[test]
    fn default_event_carries_null() {
        assert_eq!(Event::default().into_payload(), Value::Null);
    }
}
