//! Typed connections between members of a container.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use soma_types::ComponentId;

/// Semantic tag on a connection.
///
/// Directional kinds participate in cycle validation; `Peer` and `Sibling`
/// describe symmetric relationships and are exempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionType {
    /// Data moves from source to target.
    DataFlow,
    /// Source directs the behavior of target.
    Control,
    /// Source requires target to function.
    Dependency,
    /// Symmetric peer relationship.
    Peer,
    /// Symmetric sibling relationship within the same parent.
    Sibling,
}

impl ConnectionType {
    /// Returns true if this kind has a direction.
    #[must_use]
    pub fn is_directional(self) -> bool {
        matches!(self, Self::DataFlow | Self::Control | Self::Dependency)
    }
}

impl std::fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A recorded edge between two members of one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    source: ComponentId,
    target: ComponentId,
    kind: ConnectionType,
    established_at: DateTime<Utc>,
}

impl Connection {
    /// Creates a connection established now.
    #[must_use]
    pub fn new(source: ComponentId, target: ComponentId, kind: ConnectionType) -> Self {
        Self {
            source,
            target,
            kind,
            established_at: Utc::now(),
        }
    }

    /// Returns the source endpoint.
    #[must_use]
    pub fn source(&self) -> &ComponentId {
        &self.source
    }

    /// Returns the target endpoint.
    #[must_use]
    pub fn target(&self) -> &ComponentId {
        &self.target
    }

    /// Returns the connection kind.
    #[must_use]
    pub fn kind(&self) -> ConnectionType {
        self.kind
    }

    /// Returns when the connection was recorded.
    #[must_use]
    pub fn established_at(&self) -> DateTime<Utc> {
        self.established_at
    }

    /// Returns true if either endpoint is `id`.
    #[must_use]
    pub fn touches(&self, id: &ComponentId) -> bool {
        &self.source == id || &self.target == id
    }
}

impl std::fmt::Display for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let arrow = if self.kind.is_directional() {
            "->"
        } else {
            "--"
        };
        write!(
            f,
            "{} {arrow} {} ({})",
            self.source.short(),
            self.target.short(),
            self.kind
        )
    }
}
