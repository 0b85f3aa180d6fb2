//! Composite: a container that owns components and validated connections.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde_json::Value;
use soma_component::{Component, State, EARLY_LIFECYCLE, Lifecycle};
use soma_event::{Event, EventDispatcher, EventHandler, HandlerId};
use soma_types::{ComponentId, Environment, Identity};
use tracing::{debug, info};

use crate::validator::validate_connection;
use crate::{CompositeError, Connection, ConnectionType};

/// Event type emitted when the composite's aggregate state changes.
pub const COMPOSITE_STATE_CHANGED_EVENT: &str = "composite.state.changed";
/// Event type emitted when a connection is recorded.
pub const COMPOSITE_CONNECTED_EVENT: &str = "composite.connected";

/// Behavioral flavor of a composite.
///
/// Documentation and factory bookkeeping; the container mechanics are the
/// same for every kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum CompositeType {
    Standard,
    Transformation,
    Validation,
    Observer,
    Processing,
}

/// A container of components with a validated connection graph.
///
/// Members are exclusively owned and keyed by component ID. Directional
/// connections form a DAG, enforced at `connect` time. The composite has
/// its own identity, its own lifecycle state aggregated on demand from
/// member states, and a shared context visible to all members
/// (last-write-wins; there is no merge).
pub struct Composite {
    name: String,
    kind: CompositeType,
    identity: Identity,
    lifecycle: Lifecycle,
    components: RwLock<HashMap<ComponentId, Component>>,
    connections: Mutex<Vec<Connection>>,
    context: RwLock<HashMap<String, Value>>,
    dispatcher: EventDispatcher,
    created_at: DateTime<Utc>,
}

impl Composite {
    /// Creates an empty composite and walks it to [`State::Ready`].
    pub fn create(
        name: impl Into<String>,
        kind: CompositeType,
        environment: &Environment,
    ) -> Result<Self, CompositeError> {
        let name = name.into();
        let identity = Identity::adam(name.clone(), environment)
            .map_err(|err| CompositeError::InitializationFailed(err.to_string()))?;

        let composite = Self {
            name,
            kind,
            identity,
            lifecycle: Lifecycle::new(State::Conception),
            components: RwLock::new(HashMap::new()),
            connections: Mutex::new(Vec::new()),
            context: RwLock::new(HashMap::new()),
            dispatcher: EventDispatcher::new(),
            created_at: Utc::now(),
        };

        for state in EARLY_LIFECYCLE {
            composite
                .set_state(state)
                .map_err(|err| CompositeError::InitializationFailed(err.to_string()))?;
        }

        info!(
            composite = %composite.id().short(),
            name = composite.name,
            kind = ?composite.kind,
            "composite created"
        );
        Ok(composite)
    }

    /// Returns the composite's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the composite's kind.
    #[must_use]
    pub fn kind(&self) -> CompositeType {
        self.kind
    }

    /// Returns the composite's own identity.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Returns the composite's ID.
    #[must_use]
    pub fn id(&self) -> &ComponentId {
        self.identity.id()
    }

    /// Returns the current aggregate state.
    #[must_use]
    pub fn state(&self) -> State {
        self.lifecycle.current()
    }

    /// Returns when the composite was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns true if the composite has entered a termination state.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.lifecycle.is_terminated()
    }

    /// Adds a component to this composite.
    pub fn add_component(&self, component: Component) -> Result<(), CompositeError> {
        let mut components = self
            .components
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if components.contains_key(component.id()) {
            return Err(CompositeError::DuplicateComponent(component.id().clone()));
        }
        debug!(
            composite = %self.id().short(),
            component = %component.id().short(),
            "adding component"
        );
        components.insert(component.id().clone(), component);
        Ok(())
    }

    /// Removes a component and any connections touching it.
    ///
    /// Returns `false` if no such member exists.
    pub fn remove_component(&self, id: &ComponentId) -> bool {
        let removed = self
            .components
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some();
        if removed {
            self.connections
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|conn| !conn.touches(id));
        }
        removed
    }

    /// Returns a member by ID.
    #[must_use]
    pub fn component(&self, id: &ComponentId) -> Option<Component> {
        self.components
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Returns all members.
    #[must_use]
    pub fn components(&self) -> Vec<Component> {
        self.components
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Returns true if `id` is a member.
    #[must_use]
    pub fn contains(&self, id: &ComponentId) -> bool {
        self.components
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if the composite has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Connects two members.
    ///
    /// Validation and commit happen under one lock on the connection list,
    /// so two racing `connect` calls cannot each pass validation against a
    /// stale graph and jointly record a cycle. On rejection nothing is
    /// recorded.
    pub fn connect(
        &self,
        source: &ComponentId,
        target: &ComponentId,
        kind: ConnectionType,
    ) -> Result<(), CompositeError> {
        {
            let mut connections = self
                .connections
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            validate_connection(&self.name, source, target, kind, &connections, |id| {
                self.contains(id)
            })?;
            connections.push(Connection::new(source.clone(), target.clone(), kind));
        }

        debug!(
            composite = %self.id().short(),
            source = %source.short(),
            target = %target.short(),
            kind = %kind,
            "connection established"
        );
        let event = Event::new(COMPOSITE_CONNECTED_EVENT, self.id().clone(), Value::Null)
            .with_property("source", source.as_str())
            .with_property("target", target.as_str())
            .with_property("kind", kind.to_string());
        self.dispatcher.dispatch(&event);
        Ok(())
    }

    /// Returns a snapshot of recorded connections.
    #[must_use]
    pub fn connections(&self) -> Vec<Connection> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Activates the composite and every member whose state permits it.
    ///
    /// Legal only from [`State::Ready`] or [`State::Waiting`]. Members in
    /// `Ready` or `Waiting` move to `Active`; members already past that
    /// point are left untouched.
    pub fn activate(&self) -> Result<(), CompositeError> {
        let current = self.state();
        if !matches!(current, State::Ready | State::Waiting) {
            return Err(CompositeError::InvalidOperation {
                operation: "activate".to_string(),
                state: current,
            });
        }

        for component in self.components() {
            if matches!(component.state(), State::Ready | State::Waiting) {
                // Cascades skip rather than fail; a member that cannot
                // transition stays where it is.
                let _ = component.transition_to(State::Active);
            }
        }
        self.set_state(State::Active)?;
        Ok(())
    }

    /// Moves the composite and its `Active` members to [`State::Waiting`].
    pub fn set_waiting(&self) -> Result<(), CompositeError> {
        for component in self.components() {
            if component.state() == State::Active {
                let _ = component.transition_to(State::Waiting);
            }
        }
        self.set_state(State::Waiting)?;
        Ok(())
    }

    /// Terminates every member, then the composite itself.
    ///
    /// Idempotent; member termination is already idempotent per component.
    pub fn terminate(&self) {
        if self.is_terminated() {
            return;
        }
        info!(composite = %self.id().short(), "terminating composite");
        for component in self.components() {
            component.terminate();
        }
        // set_state cannot fail from a non-termination state here.
        let _ = self.set_state(State::Terminating);
        let _ = self.set_state(State::Terminated);
        self.dispatcher.clear();
    }

    /// Recomputes the aggregate state from current member states.
    ///
    /// Priority: all members terminated, then any degraded, then any
    /// active, then any ready. An empty composite, or one matching no
    /// rule, keeps its state. On-demand only; structural changes do not
    /// refresh the aggregate automatically.
    pub fn update_state(&self) -> State {
        let states: Vec<State> = self
            .components()
            .iter()
            .map(Component::state)
            .collect();

        let Some(aggregate) = aggregate_state(&states) else {
            return self.state();
        };
        if self.set_state(aggregate).is_err() {
            // A terminated composite stays terminated regardless of what
            // its members report.
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

    /// Registers a handler on the composite's dispatcher.
    pub fn register_handler(
        &self,
        event_type: impl Into<String>,
        handler: Arc<dyn EventHandler>,
    ) -> Result<HandlerId, CompositeError> {
        if self.is_terminated() {
            return Err(CompositeError::InvalidOperation {
                operation: "register handler".to_string(),
                state: self.state(),
            });
        }
        Ok(self.dispatcher.register_handler(event_type, handler))
    }

    fn set_state(&self, state: State) -> Result<(), CompositeError> {
        let previous = self.lifecycle.transition(state)?;
        if previous == state {
            return Ok(());
        }
        debug!(
            composite = %self.id().short(),
            from = ?previous,
            to = ?state,
            "composite state change"
        );
        let event = Event::new(
            COMPOSITE_STATE_CHANGED_EVENT,
            self.id().clone(),
            Value::Null,
        )
        .with_property("from", format!("{previous:?}"))
        .with_property("to", format!("{state:?}"));
        self.dispatcher.dispatch(&event);
        Ok(())
    }
}

impl std::fmt::Debug for Composite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composite")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("state", &self.state())
            .field("members", &self.len())
            .finish()
    }
}

/// Applies the aggregation priority rule; `None` means "keep current".
pub(crate) fn aggregate_state(states: &[State]) -> Option<State> {
    if states.is_empty() {
        return None;
    }
    if states.iter().all(|s| s.is_termination()) {
        return Some(State::Terminated);
    }
    if states.contains(&State::Degraded) {
        return Some(State::Degraded);
    }
    if states.contains(&State::Active) {
        return Some(State::Active);
    }
    if states.contains(&State::Ready) {
        return Some(State::Ready);
    }
    None
}
