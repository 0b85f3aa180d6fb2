//! Component entity and lifecycle state machine for the Soma framework.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Soma Workspace                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  soma-types     : ComponentId, Identity, Environment        │
//! │  soma-event     : Event, EventDispatcher                    │
//! │  soma-component : State machine, Component  ◄── HERE        │
//! │  soma-composite : Composite, Machine, cycle validator       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Lifecycle
//!
//! Every component is constructed in `Conception` and walks a fixed
//! forward sequence before callers ever see it:
//!
//! ```text
//! Conception → Initializing → Configuring → Specializing
//!            → DevelopingFeatures → Ready
//! ```
//!
//! From `Ready` movement is free except for two invariants: termination is
//! absorbing, and `Conception` is never re-entered. See [`State`].
//!
//! # Termination
//!
//! [`Component::terminate`] is idempotent and may be driven explicitly or
//! by a scheduled timer ([`Component::schedule_termination`]). The record
//! survives termination for lineage and audit purposes; only handlers and
//! runtime resources are released.
//!
//! # Example
//!
//! ```
//! use soma_component::{Component, State};
//! use soma_types::Environment;
//!
//! let env = Environment::new();
//! let component = Component::create("ingest worker", &env).unwrap();
//!
//! component.transition_to(State::Active).unwrap();
//! component.terminate();
//! assert!(component.is_terminated());
//! ```

mod component;
mod error;
mod lifecycle;
mod repository;
mod state;
pub mod testing;
mod timer;

pub use component::{Component, STATE_CHANGED_EVENT};
pub use error::ComponentError;
pub use lifecycle::Lifecycle;
pub use repository::{ComponentRepository, RepositoryError};
pub use state::{Category, State, EARLY_LIFECYCLE};
