//! Connection graph rules as observed through the public container API.

use soma_component::Component;
use soma_composite::{
    Composite, CompositeError, CompositeType, ConnectionError, ConnectionType,
};
use soma_types::{ComponentId, Environment};

fn pipeline_with(n: usize) -> (Composite, Vec<ComponentId>) {
    let environment = Environment::new();
    let composite =
        Composite::create("graph", CompositeType::Standard, &environment).unwrap();
    let mut ids = Vec::new();
    for i in 0..n {
        let component = Component::create(format!("node-{i}"), &environment).unwrap();
        ids.push(component.id().clone());
        composite.add_component(component).unwrap();
    }
    (composite, ids)
}

#[test]
fn three_node_cycle_rejected_with_all_participants_in_path() {
    let (composite, ids) = pipeline_with(3);
    let (a, b, c) = (&ids[0], &ids[1], &ids[2]);

    composite.connect(a, b, ConnectionType::DataFlow).unwrap();
    composite.connect(b, c, ConnectionType::DataFlow).unwrap();

    let err = composite.connect(c, a, ConnectionType::DataFlow).unwrap_err();
    let CompositeError::Connection(ConnectionError::CycleDetected { origin, target, path }) =
        err
    else {
        panic!("expected cycle rejection, got {err:?}");
    };
    assert_eq!(&origin, c);
    assert_eq!(&target, a);
    for id in [a, b, c] {
        assert!(path.contains(id), "cycle path missing {id}");
    }

    // Nothing was recorded for the rejected edge.
    assert_eq!(composite.connections().len(), 2);
}

#[test]
fn shared_direction_shortcut_accepted() {
    let (composite, ids) = pipeline_with(3);
    let (a, b, c) = (&ids[0], &ids[1], &ids[2]);

    composite.connect(a, b, ConnectionType::DataFlow).unwrap();
    composite.connect(b, c, ConnectionType::DataFlow).unwrap();
    // a -> c runs alongside a -> b -> c; no cycle.
    composite.connect(a, c, ConnectionType::DataFlow).unwrap();
    assert_eq!(composite.connections().len(), 3);
}

#[test]
fn mixed_kinds_share_one_graph() {
    let (composite, ids) = pipeline_with(3);
    let (a, b, c) = (&ids[0], &ids[1], &ids[2]);

    composite.connect(a, b, ConnectionType::DataFlow).unwrap();
    composite.connect(b, c, ConnectionType::Control).unwrap();

    // Directionality is what matters, not the kind label.
    let err = composite.connect(c, a, ConnectionType::Dependency).unwrap_err();
    assert!(matches!(
        err,
        CompositeError::Connection(ConnectionError::CycleDetected { .. })
    ));
}

#[test]
fn peer_edges_are_exempt_from_cycle_checks() {
    let (composite, ids) = pipeline_with(2);
    let (a, b) = (&ids[0], &ids[1]);

    composite.connect(a, b, ConnectionType::DataFlow).unwrap();
    // The symmetric edge in the "closing" direction is fine.
    composite.connect(b, a, ConnectionType::Peer).unwrap();
    composite.connect(b, a, ConnectionType::Sibling).unwrap();
    assert_eq!(composite.connections().len(), 3);
}

#[test]
fn unknown_member_rejected_before_any_graph_work() {
    let (composite, ids) = pipeline_with(1);
    let outsider = Component::create("outsider", &Environment::new()).unwrap();

    let err = composite
        .connect(&ids[0], outsider.id(), ConnectionType::DataFlow)
        .unwrap_err();
    let CompositeError::Connection(ConnectionError::NonExistentReference {
        container,
        missing,
        ..
    }) = err
    else {
        panic!("expected missing-member rejection, got {err:?}");
    };
    assert_eq!(container, "graph");
    assert_eq!(&missing, outsider.id());
    assert!(composite.connections().is_empty());
}

#[test]
fn removing_a_member_detaches_its_edges() {
    let (composite, ids) = pipeline_with(3);
    let (a, b, c) = (&ids[0], &ids[1], &ids[2]);

    composite.connect(a, b, ConnectionType::DataFlow).unwrap();
    composite.connect(b, c, ConnectionType::DataFlow).unwrap();

    assert!(composite.remove_component(b));
    assert!(composite.connections().is_empty());

    // With b gone, the previously cyclic direction is open again.
    composite.connect(c, a, ConnectionType::DataFlow).unwrap();
}
