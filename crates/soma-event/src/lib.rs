//! Event system for the Soma component framework.
//!
//! This crate provides the synchronous, in-process notification layer used
//! by components, composites, and machines to announce state changes and
//! structural events.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Soma Workspace                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  soma-types     : ComponentId, Identity, Environment        │
//! │  soma-event     : Event, EventDispatcher  ◄── HERE          │
//! │  soma-component : State machine, Component entity           │
//! │  soma-composite : Composite, Machine, cycle validator       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Delivery Model
//!
//! This is a **synchronous observer**, not a message broker:
//!
//! | Property | Guarantee |
//! |----------|-----------|
//! | Ordering | Registration order |
//! | Delivery | Once per currently-registered handler, same call stack |
//! | Isolation | One failing handler never blocks the rest |
//! | Persistence | None; events are not stored or replayed |
//!
//! # Type-Hierarchy Dispatch
//!
//! Event types are dotted paths. A handler registered for an ancestor
//! segment receives every event beneath it, and `"*"` receives everything:
//!
//! ```text
//! dispatch("component.state.changed")
//!     ├── handlers for "component.state.changed"
//!     ├── handlers for "component.state"
//!     ├── handlers for "component"
//!     └── handlers for "*"
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use soma_event::{Event, EventDispatcher, EventError, EventHandler};
//! use soma_types::ComponentId;
//!
//! struct Printer;
//!
//! impl EventHandler for Printer {
//!     fn on_event(&self, event: &Event) -> Result<(), EventError> {
//!         println!("{}: {}", event.event_type(), event.payload());
//!         Ok(())
//!     }
//! }
//!
//! let dispatcher = EventDispatcher::new();
//! dispatcher.register_handler("component.state", Arc::new(Printer));
//!
//! let source = ComponentId::parse(&"ab".repeat(32)).unwrap();
//! let event = Event::new("component.state.changed", source, serde_json::json!({}));
//! assert_eq!(dispatcher.dispatch(&event), 1);
//! ```

mod dispatcher;
mod error;
mod event;

pub use dispatcher::{EventDispatcher, EventHandler, HandlerId, WILDCARD_TYPE};
pub use error::EventError;
pub use event::Event;
