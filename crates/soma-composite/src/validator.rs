//! Connection validation: existence checks and directed-cycle detection.
//!
//! Containers enforce a DAG over their directional connections. Before an
//! edge is recorded, a depth-first search asks whether the target can
//! already reach the source through existing directional edges; if it can,
//! the new edge would close a cycle and is rejected with the discovered
//! loop attached for diagnostics.
//!
//! The search is O(V+E) per insertion, which is fine at the intended scale
//! of tens of members per container.

use std::collections::{HashMap, HashSet};

use soma_types::ComponentId;

use crate::{Connection, ConnectionError, ConnectionType};

/// Checks a prospective edge against a container's membership and its
/// existing connections.
///
/// Non-directional kinds are exempt from validation entirely. For
/// directional kinds, both endpoints must satisfy `exists`, and the edge
/// must not close a directed cycle. On rejection the caller records
/// nothing.
pub fn validate_connection(
    container: &str,
    source: &ComponentId,
    target: &ComponentId,
    kind: ConnectionType,
    existing: &[Connection],
    exists: impl Fn(&ComponentId) -> bool,
) -> Result<(), ConnectionError> {
    if !kind.is_directional() {
        return Ok(());
    }

    for endpoint in [source, target] {
        if !exists(endpoint) {
            return Err(ConnectionError::NonExistentReference {
                operation: "connect".to_string(),
                container: container.to_string(),
                missing: endpoint.clone(),
            });
        }
    }

    // The new edge supplies source -> target, so a cycle forms exactly
    // when target already reaches source.
    if let Some(walk) = find_path(existing, target, source) {
        let mut path = Vec::with_capacity(walk.len() + 1);
        path.push(source.clone());
        path.extend(walk);
        return Err(ConnectionError::CycleDetected {
            origin: source.clone(),
            target: target.clone(),
            path,
        });
    }

    Ok(())
}

/// Depth-first search over directional edges; returns the walk from `from`
/// to `to` inclusive, if one exists.
fn find_path(
    existing: &[Connection],
    from: &ComponentId,
    to: &ComponentId,
) -> Option<Vec<ComponentId>> {
    let mut adjacency: HashMap<&ComponentId, Vec<&ComponentId>> = HashMap::new();
    for conn in existing.iter().filter(|c| c.kind().is_directional()) {
        adjacency.entry(conn.source()).or_default().push(conn.target());
    }

    let mut visited = HashSet::new();
    let mut trail = Vec::new();
    if dfs(&adjacency, from, to, &mut visited, &mut trail) {
        Some(trail.into_iter().cloned().collect())
    } else {
        None
    }
}

fn dfs<'a>(
    adjacency: &'a HashMap<&'a ComponentId, Vec<&'a ComponentId>>,
    node: &'a ComponentId,
    goal: &ComponentId,
    visited: &mut HashSet<&'a ComponentId>,
    trail: &mut Vec<&'a ComponentId>,
) -> bool {
    trail.push(node);
    if node == goal {
        return true;
    }
    visited.insert(node);

    if let Some(next) = adjacency.get(node) {
        for candidate in next {
            if !visited.contains(candidate)
                && dfs(adjacency, candidate, goal, visited, trail)
            {
                return true;
            }
        }
    }

    trail.pop();
    false
}
