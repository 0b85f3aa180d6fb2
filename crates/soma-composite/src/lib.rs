//! Hierarchical composition for the Soma component framework.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Soma Workspace                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  soma-types     : ComponentId, Identity, Environment        │
//! │  soma-event     : Event, EventDispatcher                    │
//! │  soma-component : State machine, Component entity           │
//! │  soma-composite : Composite, Machine  ◄── HERE              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Containers
//!
//! A [`Composite`] owns components; a [`Machine`] groups composites. Both
//! carry their own identity and lifecycle state, cascade activation and
//! termination downward, and aggregate member states upward on demand:
//!
//! ```text
//! Machine
//!   ├── Composite "ingest"      (members: reader, parser)
//!   │     reader ──DataFlow──▶ parser
//!   └── Composite "transform"   (members: mapper, writer)
//!         mapper ──DataFlow──▶ writer
//! ```
//!
//! # DAG Enforcement
//!
//! Directional connections (`DataFlow`, `Control`, `Dependency`) must keep
//! the container's graph acyclic; `connect` validates and commits under one
//! lock, so rejection leaves nothing behind and racing calls cannot
//! jointly sneak a cycle in. `Peer` and `Sibling` edges are symmetric and
//! exempt.
//!
//! # Example
//!
//! ```
//! use soma_composite::{Composite, CompositeType, ConnectionType};
//! use soma_component::Component;
//! use soma_types::Environment;
//!
//! let env = Environment::new();
//! let pipeline = Composite::create("pipeline", CompositeType::Processing, &env).unwrap();
//!
//! let reader = Component::create("reader", &env).unwrap();
//! let parser = Component::create("parser", &env).unwrap();
//! pipeline.add_component(reader.clone()).unwrap();
//! pipeline.add_component(parser.clone()).unwrap();
//!
//! pipeline.connect(reader.id(), parser.id(), ConnectionType::DataFlow).unwrap();
//! assert!(pipeline.connect(parser.id(), reader.id(), ConnectionType::DataFlow).is_err());
//! ```

mod composite;
mod connection;
mod error;
mod machine;
mod validator;

pub use composite::{
    Composite, CompositeType, COMPOSITE_CONNECTED_EVENT, COMPOSITE_STATE_CHANGED_EVENT,
};
pub use connection::{Connection, ConnectionType};
pub use error::{CompositeError, ConnectionError, MachineError};
pub use machine::{Machine, MACHINE_STATE_CHANGED_EVENT};
pub use validator::validate_connection;
