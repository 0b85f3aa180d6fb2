//! Synchronous event dispatcher with type-hierarchy fallthrough.
//!
//! # Eligibility
//!
//! For an event of type `a.b.c`, the eligible handlers are those registered
//! for `a.b.c`, `a.b`, `a`, and the wildcard `"*"`. Within that set,
//! handlers run in global registration order on the caller's thread.
//!
//! # Fault Isolation
//!
//! A handler returning `Err` is logged and skipped over; the remaining
//! handlers still run. [`EventDispatcher::dispatch`] reports the number of
//! handlers that succeeded. This is an intentional fault-isolation
//! boundary: one faulty subscriber cannot block notification of others.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::warn;

use crate::{Event, EventError};

/// Event type that matches every dispatched event.
pub const WILDCARD_TYPE: &str = "*";

/// Handle returned by [`EventDispatcher::register_handler`], used to
/// unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Receiver of dispatched events.
///
/// Handlers must be `Send + Sync`; the dispatcher may be shared across
/// threads. A returned `Err` signals failure for this event only; the
/// handler stays registered.
pub trait EventHandler: Send + Sync {
    /// Handles a single event.
    fn on_event(&self, event: &Event) -> Result<(), EventError>;
}

// Functional registration: closures usable directly as handlers.
impl<F> EventHandler for F
where
    F: Fn(&Event) -> Result<(), EventError> + Send + Sync,
{
    fn on_event(&self, event: &Event) -> Result<(), EventError> {
        self(event)
    }
}

struct Registration {
    id: HandlerId,
    handler: Arc<dyn EventHandler>,
}

/// Best-effort, in-process publish/subscribe dispatcher.
///
/// Registration and dispatch are safe under casual concurrent use; there is
/// no delivery guarantee beyond "invoked once per currently-registered
/// handler, in-process, same call stack".
pub struct EventDispatcher {
    handlers: RwLock<HashMap<String, Vec<Registration>>>,
    next_id: AtomicU64,
}

impl EventDispatcher {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Registers a handler for an event type.
    ///
    /// Registering for an ancestor segment (e.g. `"component"`) receives
    /// every event beneath it; [`WILDCARD_TYPE`] receives everything.
    pub fn register_handler(
        &self,
        event_type: impl Into<String>,
        handler: Arc<dyn EventHandler>,
    ) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut handlers = self.handlers.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        handlers
            .entry(event_type.into())
            .or_default()
            .push(Registration { id, handler });
        id
    }

    /// Unregisters a handler previously registered for `event_type`.
    ///
    /// Returns `false` if no such registration exists.
    pub fn unregister_handler(&self, event_type: &str, id: HandlerId) -> bool {
        let mut handlers = self.handlers.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(bucket) = handlers.get_mut(event_type) else {
            return false;
        };
        let before = bucket.len();
        bucket.retain(|r| r.id != id);
        let removed = bucket.len() != before;
        if bucket.is_empty() {
            handlers.remove(event_type);
        }
        removed
    }

    /// Returns the number of handlers registered for exactly `event_type`.
    #[must_use]
    pub fn handler_count(&self, event_type: &str) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(event_type)
            .map_or(0, Vec::len)
    }

    /// Removes every registration.
    ///
    /// Called when the owning component terminates.
    pub fn clear(&self) {
        self.handlers.write().unwrap_or_else(std::sync::PoisonError::into_inner).clear();
    }

    /// Dispatches an event to every eligible handler, in registration
    /// order, on the calling thread.
    ///
    /// Returns the count of handlers that completed successfully. Handler
    /// failures are logged and isolated; they never propagate to the
    /// caller.
    pub fn dispatch(&self, event: &Event) -> usize {
        let eligible: Vec<(HandlerId, Arc<dyn EventHandler>)> = {
            let handlers = self.handlers.read().unwrap_or_else(std::sync::PoisonError::into_inner);
            let mut selected = Vec::new();
            for key in eligibility_chain(event.event_type()) {
                if let Some(bucket) = handlers.get(key.as_ref()) {
                    for reg in bucket {
                        selected.push((reg.id, Arc::clone(&reg.handler)));
                    }
                }
            }
            // Global registration order across buckets.
            selected.sort_by_key(|(id, _)| id.0);
            selected
        };

        let mut succeeded = 0;
        for (id, handler) in eligible {
            match handler.on_event(event) {
                Ok(()) => succeeded += 1,
                Err(err) => {
                    warn!(
                        event_type = event.event_type(),
                        source = %event.source().short(),
                        handler = id.0,
                        error = %err,
                        "event handler failed; continuing with remaining handlers"
                    );
                }
            }
        }
        succeeded
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        f.debug_struct("EventDispatcher")
            .field("event_types", &handlers.len())
            .finish()
    }
}

/// Yields the exact type, each dotted ancestor, then the wildcard.
fn eligibility_chain(event_type: &str) -> impl Iterator<Item = std::borrow::Cow<'_, str>> {
    let mut keys: Vec<std::borrow::Cow<'_, str>> = Vec::new();
    keys.push(event_type.into());
    let mut rest = event_type;
    while let Some(idx) = rest.rfind('.') {
        rest = &rest[..idx];
        keys.push(rest.into());
    }
    keys.push(WILDCARD_TYPE.into());
    keys.into_iter()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    use soma_types::ComponentId;

    fn source() -> ComponentId {
        ComponentId::parse(&"12".repeat(32)).unwrap()
    }

    fn event(event_type: &str) -> Event {
        Event::new(event_type, source(), serde_json::Value::Null)
    }

    struct Counting(AtomicUsize);

    impl EventHandler for Counting {
        fn on_event(&self, _: &Event) -> Result<(), EventError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn dispatch_exact_type() {
        let dispatcher = EventDispatcher::new();
        let counter = Arc::new(Counting(AtomicUsize::new(0)));
        dispatcher.register_handler("a.b", counter.clone());

        assert_eq!(dispatcher.dispatch(&event("a.b")), 1);
        assert_eq!(dispatcher.dispatch(&event("other")), 0);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dispatch_ancestor_fallthrough() {
        let dispatcher = EventDispatcher::new();
        let counter = Arc::new(Counting(AtomicUsize::new(0)));
        dispatcher.register_handler("component", counter.clone());

        assert_eq!(dispatcher.dispatch(&event("component.state.changed")), 1);
        assert_eq!(dispatcher.dispatch(&event("component.created")), 1);
        assert_eq!(dispatcher.dispatch(&event("composite.created")), 0);
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dispatch_wildcard() {
        let dispatcher = EventDispatcher::new();
        let counter = Arc::new(Counting(AtomicUsize::new(0)));
        dispatcher.register_handler(WILDCARD_TYPE, counter.clone());

        dispatcher.dispatch(&event("anything.at.all"));
        dispatcher.dispatch(&event("x"));
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn registration_order_preserved_across_buckets() {
        let dispatcher = EventDispatcher::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for (tag, key) in [("exact", "a.b"), ("wild", "*"), ("ancestor", "a")] {
            let order = Arc::clone(&order);
            dispatcher.register_handler(
                key,
                Arc::new(move |_: &Event| {
                    order.lock().unwrap().push(tag);
                    Ok(())
                }),
            );
        }

        dispatcher.dispatch(&event("a.b"));
        assert_eq!(*order.lock().unwrap(), vec!["exact", "wild", "ancestor"]);
    }

    #[test]
    fn failing_handler_is_isolated() {
        let dispatcher = EventDispatcher::new();
        let counter = Arc::new(Counting(AtomicUsize::new(0)));

        dispatcher.register_handler(
            "t",
            Arc::new(|_: &Event| Err(EventError::HandlerFailed("boom".into()))),
        );
        dispatcher.register_handler("t", counter.clone());

        // The failure is swallowed; the second handler still runs and only
        // it counts as a success.
        assert_eq!(dispatcher.dispatch(&event("t")), 1);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unregister_stops_delivery() {
        let dispatcher = EventDispatcher::new();
        let counter = Arc::new(Counting(AtomicUsize::new(0)));
        let id = dispatcher.register_handler("t", counter.clone());

        assert!(dispatcher.unregister_handler("t", id));
        assert!(!dispatcher.unregister_handler("t", id));
        assert_eq!(dispatcher.dispatch(&event("t")), 0);
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn clear_removes_everything() {
        let dispatcher = EventDispatcher::new();
        dispatcher.register_handler("a", Arc::new(|_: &Event| Ok(())));
        dispatcher.register_handler("*", Arc::new(|_: &Event| Ok(())));

        dispatcher.clear();
        assert_eq!(dispatcher.dispatch(&event("a")), 0);
        assert_eq!(dispatcher.handler_count("a"), 0);
    }

    #[test]
    fn eligibility_chain_order() {
        let keys: Vec<String> = eligibility_chain("a.b.c").map(|k| k.into_owned()).collect();
        assert_eq!(keys, vec!["a.b.c", "a.b", "a", "*"]);

        let flat: Vec<String> = eligibility_chain("solo").map(|k| k.into_owned()).collect();
        assert_eq!(flat, vec!["solo", "*"]);
    }
}
