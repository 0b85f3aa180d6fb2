//! The component entity.
//!
//! A [`Component`] is a cheaply clonable handle over shared inner state, so
//! a termination timer thread can drive the same termination path a caller
//! would. Construction walks the fixed early lifecycle sequence before the
//! handle is ever returned; a half-built component is unreachable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use serde_json::Value;
use soma_event::{Event, EventDispatcher, EventHandler, HandlerId};
use soma_types::{ComponentId, Environment, Identity};
use tracing::{debug, info, warn};

use crate::timer::TerminationTimer;
use crate::{ComponentError, Lifecycle, State, EARLY_LIFECYCLE};

/// Event type emitted on every state change, with `from`/`to` properties.
pub const STATE_CHANGED_EVENT: &str = "component.state.changed";

struct ComponentInner {
    identity: Identity,
    environment: Environment,
    lifecycle: Lifecycle,
    properties: RwLock<HashMap<String, Value>>,
    children: RwLock<Vec<Identity>>,
    dispatcher: EventDispatcher,
    timer: Mutex<Option<TerminationTimer>>,
    timer_generation: AtomicU64,
    terminating: AtomicBool,
}

/// A uniquely identified unit with its own lifecycle state and properties.
///
/// Clones share one underlying component; state observed through any clone
/// is state observed through all of them.
///
/// # Example
///
/// ```
/// use soma_component::{Component, State};
/// use soma_types::Environment;
///
/// let env = Environment::new();
/// let root = Component::create("data pipeline root", &env).unwrap();
/// assert_eq!(root.state(), State::Ready);
///
/// let child = Component::create_child("ingest stage", &env, &root).unwrap();
/// assert!(child.identity().is_descendant_of(root.identity()));
/// ```
#[derive(Clone)]
pub struct Component {
    inner: Arc<ComponentInner>,
}

impl Component {
    /// Creates a root (adam) component and walks it to [`State::Ready`].
    pub fn create(
        reason: impl Into<String>,
        environment: &Environment,
    ) -> Result<Self, ComponentError> {
        let identity = Identity::adam(reason, environment)
            .map_err(|err| ComponentError::InitializationFailed(err.to_string()))?;
        Self::build(identity, environment.clone())
    }

    /// Creates a child component under `parent` and walks it to
    /// [`State::Ready`]. The child's identity is registered on the parent.
    pub fn create_child(
        reason: impl Into<String>,
        environment: &Environment,
        parent: &Component,
    ) -> Result<Self, ComponentError> {
        let identity = Identity::child(reason, environment, parent.identity())
            .map_err(|err| ComponentError::InitializationFailed(err.to_string()))?;
        let child = Self::build(identity, environment.clone())?;
        parent.register_child(child.identity().clone());
        Ok(child)
    }

    fn build(identity: Identity, environment: Environment) -> Result<Self, ComponentError> {
        let component = Self {
            inner: Arc::new(ComponentInner {
                identity,
                environment,
                lifecycle: Lifecycle::new(State::Conception),
                properties: RwLock::new(HashMap::new()),
                children: RwLock::new(Vec::new()),
                dispatcher: EventDispatcher::new(),
                timer: Mutex::new(None),
                timer_generation: AtomicU64::new(0),
                terminating: AtomicBool::new(false),
            }),
        };

        // The early sequence is deterministic and has no branching; any
        // failure aborts construction entirely.
        for state in EARLY_LIFECYCLE {
            component
                .transition_to(state)
                .map_err(|err| ComponentError::InitializationFailed(err.to_string()))?;
        }

        info!(
            component = %component.id().short(),
            address = component.address(),
            "component created"
        );
        Ok(component)
    }

    /// Returns this component's identity.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.inner.identity
    }

    /// Returns this component's ID.
    #[must_use]
    pub fn id(&self) -> &ComponentId {
        self.inner.identity.id()
    }

    /// Returns the creation reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        self.inner.identity.reason()
    }

    /// Returns the hierarchical address.
    #[must_use]
    pub fn address(&self) -> &str {
        self.inner.identity.address()
    }

    /// Returns the lineage of creation reasons, oldest first.
    #[must_use]
    pub fn lineage(&self) -> &[String] {
        self.inner.identity.lineage()
    }

    /// Returns the environment this component was created in.
    #[must_use]
    pub fn environment(&self) -> &Environment {
        &self.inner.environment
    }

    /// Returns the identities of registered children.
    #[must_use]
    pub fn children(&self) -> Vec<Identity> {
        self.inner
            .children
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn register_child(&self, child: Identity) {
        debug!(
            component = %self.id().short(),
            child = %child.id().short(),
            "registering child component"
        );
        self.inner
            .children
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(child);
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> State {
        self.inner.lifecycle.current()
    }

    /// Returns true if this component has entered a termination state.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.inner.lifecycle.is_terminated()
    }

    /// Returns true if the current state is operational.
    #[must_use]
    pub fn is_operational(&self) -> bool {
        self.state().is_operational()
    }

    /// Returns true if the component is in [`State::Ready`].
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state() == State::Ready
    }

    /// Moves to `state`, emitting [`STATE_CHANGED_EVENT`] on success.
    ///
    /// A transition to the current state is a silent no-op.
    pub fn transition_to(&self, state: State) -> Result<(), ComponentError> {
        let previous = self.inner.lifecycle.transition(state)?;
        if previous == state {
            return Ok(());
        }

        debug!(
            component = %self.id().short(),
            from = ?previous,
            to = ?state,
            "state transition"
        );
        let event = Event::new(STATE_CHANGED_EVENT, self.id().clone(), Value::Null)
            .with_property("from", format!("{previous:?}"))
            .with_property("to", format!("{state:?}"));
        self.inner.dispatcher.dispatch(&event);
        Ok(())
    }

    /// Sets a named property.
    pub fn set_property(&self, key: impl Into<String>, value: Value) {
        self.inner
            .properties
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value);
    }

    /// Returns a property value, if set.
    #[must_use]
    pub fn get_property(&self, key: &str) -> Option<Value> {
        self.inner
            .properties
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Returns a snapshot of all properties.
    #[must_use]
    pub fn properties(&self) -> HashMap<String, Value> {
        self.inner
            .properties
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Publishes an event from this component, returning the number of
    /// handlers that processed it successfully.
    ///
    /// Terminated components may not publish.
    pub fn publish_event(
        &self,
        event_type: impl Into<String>,
        payload: Value,
        properties: &[(&str, &str)],
    ) -> Result<usize, ComponentError> {
        self.guard_not_terminated("publish event")?;
        let mut event = Event::new(event_type, self.id().clone(), payload);
        for (key, value) in properties {
            event = event.with_property(*key, *value);
        }
        Ok(self.inner.dispatcher.dispatch(&event))
    }

    /// Registers a handler on this component's dispatcher.
    ///
    /// Terminated components may not accept new handlers.
    pub fn register_handler(
        &self,
        event_type: impl Into<String>,
        handler: Arc<dyn EventHandler>,
    ) -> Result<HandlerId, ComponentError> {
        self.guard_not_terminated("register handler")?;
        Ok(self.inner.dispatcher.register_handler(event_type, handler))
    }

    /// Unregisters a previously registered handler.
    pub fn unregister_handler(&self, event_type: &str, id: HandlerId) -> bool {
        self.inner.dispatcher.unregister_handler(event_type, id)
    }

    /// Schedules automatic termination after `delay`.
    ///
    /// A pending timer is canceled and replaced. Zero delay is rejected.
    pub fn schedule_termination(&self, delay: Duration) -> Result<(), ComponentError> {
        if delay.is_zero() {
            return Err(ComponentError::InvalidTerminationDelay);
        }
        self.guard_not_terminated("schedule termination")?;

        let generation = self.inner.timer_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let this = self.clone();
        let timer = TerminationTimer::spawn(generation, delay, move || {
            // Clear our own slot first so terminate() never cancels the
            // timer that is currently firing. A replacement timer has a
            // different generation and is left alone.
            {
                let mut slot = this.inner.timer.lock().unwrap_or_else(PoisonError::into_inner);
                if slot.as_ref().map(TerminationTimer::generation) == Some(generation) {
                    *slot = None;
                }
            }
            info!(component = %this.id().short(), "scheduled termination fired");
            this.terminate();
        });

        let previous = {
            let mut slot = self
                .inner
                .timer
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            slot.replace(timer)
        };
        if let Some(previous) = previous {
            debug!(
                component = %self.id().short(),
                "replacing pending termination timer"
            );
            previous.cancel();
        }
        Ok(())
    }

    /// Cancels a pending scheduled termination, if any.
    ///
    /// Best-effort: a timer that already passed its deadline still fires.
    pub fn cancel_termination_timer(&self) {
        let timer = self
            .inner
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(timer) = timer {
            timer.cancel();
        }
    }

    /// Terminates this component.
    ///
    /// Idempotent: calling terminate on a component that is terminated, or
    /// already terminating on another thread, is a safe no-op. The sequence
    /// is: cancel any pending timer, enter [`State::Terminating`], preserve
    /// knowledge, release resources, enter [`State::Terminated`], then drop
    /// all event handlers.
    pub fn terminate(&self) {
        if self.is_terminated() || self.inner.terminating.swap(true, Ordering::SeqCst) {
            return;
        }

        info!(component = %self.id().short(), "terminating component");
        self.cancel_termination_timer();
        self.transition_logged(State::Terminating);
        self.preserve_knowledge();
        self.release_resources();
        self.transition_logged(State::Terminated);
        self.inner.dispatcher.clear();
    }

    // Extension point: subclasses of the original design archived learned
    // state here before shutdown. The base behavior is to record that the
    // opportunity existed.
    fn preserve_knowledge(&self) {
        debug!(component = %self.id().short(), "preserving knowledge before termination");
    }

    fn release_resources(&self) {
        debug!(component = %self.id().short(), "releasing component resources");
    }

    // Terminate-path transitions cannot fail under the terminating guard,
    // but a failure must not panic the timer thread.
    fn transition_logged(&self, state: State) {
        if let Err(err) = self.transition_to(state) {
            warn!(
                component = %self.id().short(),
                error = %err,
                "transition during termination rejected"
            );
        }
    }

    fn guard_not_terminated(&self, operation: &str) -> Result<(), ComponentError> {
        if self.is_terminated() {
            return Err(ComponentError::Terminated {
                operation: operation.to_string(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id().short())
            .field("address", &self.address())
            .field("state", &self.state())
            .finish()
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{:?}]", self.address(), self.state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CollectingHandler;
    use std::thread;

    fn env() -> Environment {
        Environment::new()
    }

    fn wait_until(check: impl Fn() -> bool) -> bool {
        for _ in 0..300 {
            if check() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        check()
    }

    #[test]
    fn create_reaches_ready() {
        let component = Component::create("root", &env()).unwrap();
        assert_eq!(component.state(), State::Ready);
        assert!(component.is_ready());
        assert!(component.identity().is_adam());
    }

    #[test]
    fn child_creation_registers_and_addresses() {
        let environment = env();
        let parent = Component::create("parent", &environment).unwrap();
        let child = Component::create_child("child", &environment, &parent).unwrap();

        let expected = format!("{}.{}", parent.address(), child.id().short());
        assert_eq!(child.address(), expected);
        assert_eq!(child.lineage(), &["parent".to_string(), "child".to_string()]);

        let children = parent.children();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id(), child.id());
    }

    #[test]
    fn transition_emits_state_changed_event() {
        let component = Component::create("emitter", &env()).unwrap();
        let handler = Arc::new(CollectingHandler::new());
        component
            .register_handler(STATE_CHANGED_EVENT, handler.clone())
            .unwrap();

        component.transition_to(State::Active).unwrap();

        let events = handler.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].property("from"), Some("Ready"));
        assert_eq!(events[0].property("to"), Some("Active"));
    }

    #[test]
    fn noop_transition_emits_nothing() {
        let component = Component::create("quiet", &env()).unwrap();
        let handler = Arc::new(CollectingHandler::new());
        component
            .register_handler(STATE_CHANGED_EVENT, handler.clone())
            .unwrap();

        component.transition_to(State::Ready).unwrap();
        assert_eq!(handler.count(), 0);
    }

    #[test]
    fn properties_roundtrip() {
        let component = Component::create("props", &env()).unwrap();
        component.set_property("batch", serde_json::json!(42));
        assert_eq!(component.get_property("batch"), Some(serde_json::json!(42)));
        assert_eq!(component.get_property("missing"), None);
        assert_eq!(component.properties().len(), 1);
    }

    #[test]
    fn terminate_is_idempotent() {
        let component = Component::create("mortal", &env()).unwrap();
        component.terminate();
        assert_eq!(component.state(), State::Terminated);
        component.terminate();
        assert_eq!(component.state(), State::Terminated);
    }

    #[test]
    fn terminated_component_rejects_operations() {
        let component = Component::create("done", &env()).unwrap();
        component.terminate();

        let err = component
            .publish_event("x", Value::Null, &[])
            .unwrap_err();
        assert!(matches!(err, ComponentError::Terminated { .. }));

        let handler = Arc::new(CollectingHandler::new());
        let err = component
            .register_handler("x", handler)
            .unwrap_err();
        assert!(matches!(err, ComponentError::Terminated { .. }));

        let err = component
            .schedule_termination(Duration::from_millis(50))
            .unwrap_err();
        assert!(matches!(err, ComponentError::Terminated { .. }));
    }

    #[test]
    fn zero_delay_rejected() {
        let component = Component::create("timer", &env()).unwrap();
        let err = component.schedule_termination(Duration::ZERO).unwrap_err();
        assert_eq!(err, ComponentError::InvalidTerminationDelay);
    }

    #[test]
    fn scheduled_termination_fires() {
        let component = Component::create("timed", &env()).unwrap();
        component
            .schedule_termination(Duration::from_millis(20))
            .unwrap();
        assert!(wait_until(|| component.is_terminated()));
    }

    #[test]
    fn canceled_timer_does_not_fire() {
        let component = Component::create("spared", &env()).unwrap();
        component
            .schedule_termination(Duration::from_millis(200))
            .unwrap();
        component.cancel_termination_timer();
        thread::sleep(Duration::from_millis(400));
        assert!(!component.is_terminated());
    }

    #[test]
    fn rescheduling_replaces_timer() {
        let component = Component::create("rescheduled", &env()).unwrap();
        component
            .schedule_termination(Duration::from_secs(60))
            .unwrap();
        component
            .schedule_termination(Duration::from_millis(20))
            .unwrap();
        assert!(wait_until(|| component.is_terminated()));
    }

    #[test]
    fn terminate_clears_handlers() {
        let component = Component::create("cleared", &env()).unwrap();
        let handler = Arc::new(CollectingHandler::new());
        component
            .register_handler(STATE_CHANGED_EVENT, handler.clone())
            .unwrap();

        component.terminate();
        // Terminating and Terminated were both observed before the clear.
        assert_eq!(handler.count(), 2);
    }

    #[test]
    fn clones_share_state() {
        let component = Component::create("shared", &env()).unwrap();
        let other = component.clone();
        component.transition_to(State::Active).unwrap();
        assert_eq!(other.state(), State::Active);
    }
}
