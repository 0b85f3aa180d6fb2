//! Event value type.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use soma_types::ComponentId;
use uuid::Uuid;

/// A dispatched notification.
///
/// Events carry a dotted type string, the emitting component's ID, an
/// arbitrary JSON payload, and a small string property map for cheap
/// key/value annotations (state names, operation tags). They are never
/// persisted.
///
/// # Example
///
/// ```
/// use soma_event::Event;
/// use soma_types::ComponentId;
///
/// let source = ComponentId::parse(&"cd".repeat(32)).unwrap();
/// let event = Event::new("component.state.changed", source, serde_json::json!({"detail": 1}))
///     .with_property("from", "Ready")
///     .with_property("to", "Active");
///
/// assert_eq!(event.property("to"), Some("Active"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    id: Uuid,
    event_type: String,
    source: ComponentId,
    payload: Value,
    properties: HashMap<String, String>,
    occurred_at: DateTime<Utc>,
}

impl Event {
    /// Creates a new event.
    #[must_use]
    pub fn new(event_type: impl Into<String>, source: ComponentId, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type: event_type.into(),
            source,
            payload,
            properties: HashMap::new(),
            occurred_at: Utc::now(),
        }
    }

    /// Adds a string property (builder style).
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Returns the event's unique id.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the dotted event type.
    #[must_use]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Returns the emitting component's ID.
    #[must_use]
    pub fn source(&self) -> &ComponentId {
        &self.source
    }

    /// Returns the JSON payload.
    #[must_use]
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Returns a property value.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Returns the full property map.
    #[must_use]
    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }

    /// Returns when the event was created.
    #[must_use]
    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} from {}", self.event_type, self.source.short())
    }
}
