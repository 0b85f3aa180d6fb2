//! Testing helpers for component-based code.
//!
//! Provides an in-memory [`ComponentRepository`] and two canned event
//! handlers, so tests can exercise storage and dispatch behavior without
//! standing up real infrastructure.
//!
//! # Example
//!
//! ```
//! use soma_component::testing::{CollectingHandler, InMemoryComponentRepository};
//! use soma_component::{Component, ComponentRepository};
//! use soma_types::Environment;
//! use std::sync::Arc;
//!
//! let repository = InMemoryComponentRepository::new();
//! let component = Component::create("unit under test", &Environment::new()).unwrap();
//! repository.save(&component).unwrap();
//!
//! let handler = Arc::new(CollectingHandler::new());
//! component.register_handler("*", handler.clone()).unwrap();
//! component.publish_event("test.ping", serde_json::Value::Null, &[]).unwrap();
//! assert_eq!(handler.count(), 1);
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock};

use soma_event::{Event, EventError, EventHandler};
use soma_types::ComponentId;

use crate::{Component, ComponentRepository, RepositoryError};

/// Reference [`ComponentRepository`] backed by a `HashMap`.
#[derive(Default)]
pub struct InMemoryComponentRepository {
    components: RwLock<HashMap<ComponentId, Component>>,
}

impl InMemoryComponentRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of saved components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing is saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ComponentRepository for InMemoryComponentRepository {
    fn save(&self, component: &Component) -> Result<(), RepositoryError> {
        let mut components = self
            .components
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if components.contains_key(component.id()) {
            return Err(RepositoryError::Duplicate(component.id().clone()));
        }
        components.insert(component.id().clone(), component.clone());
        Ok(())
    }

    fn find_by_id(&self, id: &ComponentId) -> Result<Option<Component>, RepositoryError> {
        Ok(self
            .components
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned())
    }

    fn find_all(&self) -> Result<Vec<Component>, RepositoryError> {
        Ok(self
            .components
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect())
    }

    fn find_children(&self, parent: &ComponentId) -> Result<Vec<Component>, RepositoryError> {
        Ok(self
            .components
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|c| matches!(c.identity().parent_id(), Ok(Some(ref p)) if p == parent))
            .cloned()
            .collect())
    }

    fn delete(&self, id: &ComponentId) -> Result<(), RepositoryError> {
        self.components
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(id.clone()))
    }
}

/// Handler that records every event it receives.
#[derive(Default)]
pub struct CollectingHandler {
    events: Mutex<Vec<Event>>,
}

impl CollectingHandler {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the received events.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns how many events were received.
    #[must_use]
    pub fn count(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl EventHandler for CollectingHandler {
    fn on_event(&self, event: &Event) -> Result<(), EventError> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }
}

/// Handler that fails on every event, for dispatch-isolation tests.
pub struct FailingHandler {
    message: String,
}

impl FailingHandler {
    /// Creates a handler that fails with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl EventHandler for FailingHandler {
    fn on_event(&self, _: &Event) -> Result<(), EventError> {
        Err(EventError::HandlerFailed(self.message.clone()))
    }
}
