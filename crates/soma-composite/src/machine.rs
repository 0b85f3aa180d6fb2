//! Machine: a container of composites.
//!
//! A machine applies the same container mechanics one level up: composites
//! are registered by ID, machine-level connections between composites are
//! validated against the same DAG rule, and the machine's aggregate state
//! derives from its composites' states with the same priority rule.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde_json::Value;
use soma_component::{Lifecycle, State, EARLY_LIFECYCLE};
use soma_event::{Event, EventDispatcher, EventHandler, HandlerId};
use soma_types::{ComponentId, Environment, Identity};
use tracing::{debug, info};

use crate::composite::aggregate_state;
use crate::validator::validate_connection;
use crate::{Composite, Connection, ConnectionType, MachineError};

/// Event type emitted when the machine's aggregate state changes.
pub const MACHINE_STATE_CHANGED_EVENT: &str = "machine.state.changed";

/// Top-level container grouping composites.
pub struct Machine {
    name: String,
    identity: Identity,
    lifecycle: Lifecycle,
    composites: RwLock<HashMap<ComponentId, Arc<Composite>>>,
    connections: Mutex<Vec<Connection>>,
    context: RwLock<HashMap<String, Value>>,
    dispatcher: EventDispatcher,
    created_at: DateTime<Utc>,
}

impl Machine {
    /// Creates an empty machine and walks it to [`State::Ready`].
    pub fn create(
        name: impl Into<String>,
        environment: &Environment,
    ) -> Result<Self, MachineError> {
        let name = name.into();
        let identity = Identity::adam(name.clone(), environment)
            .map_err(|err| MachineError::InitializationFailed(err.to_string()))?;

        let machine = Self {
            name,
            identity,
            lifecycle: Lifecycle::new(State::Conception),
            composites: RwLock::new(HashMap::new()),
            connections: Mutex::new(Vec::new()),
            context: RwLock::new(HashMap::new()),
            dispatcher: EventDispatcher::new(),
            created_at: Utc::now(),
        };

        for state in EARLY_LIFECYCLE {
            machine
                .set_state(state)
                .map_err(|err| MachineError::InitializationFailed(err.to_string()))?;
        }

        info!(machine = %machine.id().short(), name = machine.name, "machine created");
        Ok(machine)
    }

    /// Returns the machine's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the machine's own identity.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Returns the machine's ID.
    #[must_use]
    pub fn id(&self) -> &ComponentId {
        self.identity.id()
    }

    /// Returns the current aggregate state.
    #[must_use]
    pub fn state(&self) -> State {
        self.lifecycle.current()
    }

    /// Returns when the machine was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns true if the machine has entered a termination state.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.lifecycle.is_terminated()
    }

    /// Registers a composite.
    pub fn register_composite(&self, composite: Arc<Composite>) -> Result<(), MachineError> {
        let mut composites = self
            .composites
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if composites.contains_key(composite.id()) {
            return Err(MachineError::DuplicateComposite(composite.id().clone()));
        }
        debug!(
            machine = %self.id().short(),
            composite = %composite.id().short(),
            "registering composite"
        );
        composites.insert(composite.id().clone(), composite);
        Ok(())
    }

    /// Removes and returns a composite, pruning connections touching it.
    pub fn remove_composite(&self, id: &ComponentId) -> Result<Arc<Composite>, MachineError> {
        let removed = self
            .composites
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .ok_or_else(|| MachineError::CompositeNotFound(id.clone()))?;
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|conn| !conn.touches(id));
        Ok(removed)
    }

    /// Returns a registered composite by ID.
    #[must_use]
    pub fn composite(&self, id: &ComponentId) -> Option<Arc<Composite>> {
        self.composites
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Returns all registered composites.
    #[must_use]
    pub fn composites(&self) -> Vec<Arc<Composite>> {
        self.composites
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Returns the number of registered composites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.composites
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if no composites are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Connects two endpoints at machine level.
    ///
    /// An endpoint may be a registered composite itself or any component
    /// inside a registered composite. Same validator and same
    /// validate+commit atomicity as
    /// [`Composite::connect`](crate::Composite::connect).
    pub fn connect(
        &self,
        source: &ComponentId,
        target: &ComponentId,
        kind: ConnectionType,
    ) -> Result<(), MachineError> {
        let mut connections = self
            .connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        validate_connection(&self.name, source, target, kind, &connections, |id| {
            let composites = self
                .composites
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            composites.contains_key(id) || composites.values().any(|c| c.contains(id))
        })?;
        connections.push(Connection::new(source.clone(), target.clone(), kind));
        Ok(())
    }

    /// Returns a snapshot of machine-level connections.
    #[must_use]
    pub fn connections(&self) -> Vec<Connection> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Activates the machine, cascading to composites whose state permits.
    pub fn activate(&self) -> Result<(), MachineError> {
        let current = self.state();
        if !matches!(current, State::Ready | State::Waiting) {
            return Err(MachineError::InvalidOperation {
                operation: "activate".to_string(),
                state: current,
            });
        }
        for composite in self.composites() {
            if matches!(composite.state(), State::Ready | State::Waiting) {
                let _ = composite.activate();
            }
        }
        self.set_state(State::Active)?;
        Ok(())
    }

    /// Moves the machine and its active composites to [`State::Waiting`].
    pub fn set_waiting(&self) -> Result<(), MachineError> {
        for composite in self.composites() {
            if composite.state() == State::Active {
                let _ = composite.set_waiting();
            }
        }
        self.set_state(State::Waiting)?;
        Ok(())
    }

    /// Terminates every composite, then the machine itself. Idempotent.
    pub fn terminate(&self) {
        if self.is_terminated() {
            return;
        }
        info!(machine = %self.id().short(), "terminating machine");
        for composite in self.composites() {
            composite.terminate();
        }
        let _ = self.set_state(State::Terminating);
        let _ = self.set_state(State::Terminated);
        self.dispatcher.clear();
    }

    /// Recomputes the aggregate state from composite states, with the same
    /// priority rule composites apply to their members.
    pub fn update_state(&self) -> State {
        let states: Vec<State> = self.composites().iter().map(|c| c.state()).collect();
        let Some(aggregate) = aggregate_state(&states) else {
            return self.state();
        };
        if self.set_state(aggregate).is_err() {
            return self.state();
        }
        aggregate
    }

    /// Returns a shared-context value.
    #[must_use]
    pub fn context_value(&self, key: &str) -> Option<Value> {
        self.context
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Sets a shared-context value. Last write wins.
    pub fn set_context_value(&self, key: impl Into<String>, value: Value) {
        self.context
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value);
    }

    /// Registers a handler on the machine's dispatcher.
    pub fn register_handler(
        &self,
        event_type: impl Into<String>,
        handler: Arc<dyn EventHandler>,
    ) -> Result<HandlerId, MachineError> {
        if self.is_terminated() {
            return Err(MachineError::InvalidOperation {
                operation: "register handler".to_string(),
                state: self.state(),
            });
        }
        Ok(self.dispatcher.register_handler(event_type, handler))
    }

    fn set_state(&self, state: State) -> Result<(), MachineError> {
        let previous = self.lifecycle.transition(state)?;
        if previous == state {
            return Ok(());
        }
        debug!(
            machine = %self.id().short(),
            from = ?previous,
            to = ?state,
            "machine state change"
        );
        let event = Event::new(MACHINE_STATE_CHANGED_EVENT, self.id().clone(), Value::Null)
            .with_property("from", format!("{previous:?}"))
            .with_property("to", format!("{state:?}"));
        self.dispatcher.dispatch(&event);
        Ok(())
    }
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("composites", &self.len())
            .finish()
    }
}
