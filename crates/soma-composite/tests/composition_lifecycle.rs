//! End-to-end lifecycle flows across components, composites, and machines.

use std::sync::Arc;

use soma_component::testing::CollectingHandler;
use soma_component::{Component, State};
use soma_composite::{Composite, CompositeType, ConnectionType, Machine};
use soma_types::Environment;

fn env() -> Environment {
    let mut environment = Environment::new();
    environment.set("host", "test");
    environment
}

#[test]
fn pipeline_from_creation_to_termination() {
    let environment = env();
    let machine = Machine::create("refinery", &environment).unwrap();

    let ingest = Arc::new(
        Composite::create("ingest", CompositeType::Processing, &environment).unwrap(),
    );
    let reader = Component::create("reader", &environment).unwrap();
    let parser = Component::create("parser", &environment).unwrap();
    ingest.add_component(reader.clone()).unwrap();
    ingest.add_component(parser.clone()).unwrap();
    ingest
        .connect(reader.id(), parser.id(), ConnectionType::DataFlow)
        .unwrap();

    machine.register_composite(Arc::clone(&ingest)).unwrap();

    machine.activate().unwrap();
    assert_eq!(machine.state(), State::Active);
    assert_eq!(ingest.state(), State::Active);
    assert_eq!(reader.state(), State::Active);
    assert_eq!(parser.state(), State::Active);

    machine.set_waiting().unwrap();
    assert_eq!(reader.state(), State::Waiting);

    machine.terminate();
    assert!(machine.is_terminated());
    assert!(ingest.is_terminated());
    assert!(reader.is_terminated());
    assert!(parser.is_terminated());

    // Termination is idempotent at every level.
    machine.terminate();
    ingest.terminate();
    reader.terminate();
    assert_eq!(reader.state(), State::Terminated);
}

#[test]
fn identities_are_unique_for_identical_inputs() {
    let environment = env();
    let a = Component::create("same reason", &environment).unwrap();
    let b = Component::create("same reason", &environment).unwrap();
    assert_ne!(a.id(), b.id());
}

#[test]
fn child_addresses_extend_the_parent() {
    let environment = env();
    let root = Component::create("root", &environment).unwrap();
    let child = Component::create_child("child", &environment, &root).unwrap();
    let grandchild = Component::create_child("grandchild", &environment, &child).unwrap();

    assert!(!root.address().contains('.'));
    assert!(grandchild.address().starts_with(child.address()));
    assert_eq!(grandchild.address().matches('.').count(), 2);
    assert!(grandchild.identity().is_descendant_of(root.identity()));
}

#[test]
fn aggregate_state_mixes_members_by_priority() {
    let environment = env();
    let composite =
        Composite::create("mixed", CompositeType::Standard, &environment).unwrap();
    let live = Component::create("live", &environment).unwrap();
    let dead = Component::create("dead", &environment).unwrap();
    composite.add_component(live.clone()).unwrap();
    composite.add_component(dead.clone()).unwrap();

    live.transition_to(State::Active).unwrap();
    dead.terminate();

    // One terminated plus one active member reads as active.
    assert_eq!(composite.update_state(), State::Active);

    live.terminate();
    assert_eq!(composite.update_state(), State::Terminated);
}

#[test]
fn composite_state_change_notifies_subscribers() {
    let environment = env();
    let composite =
        Composite::create("observed", CompositeType::Observer, &environment).unwrap();
    let handler = Arc::new(CollectingHandler::new());
    composite
        .register_handler("composite.state.changed", handler.clone())
        .unwrap();

    let member = Component::create("member", &environment).unwrap();
    composite.add_component(member.clone()).unwrap();
    member.transition_to(State::Active).unwrap();
    composite.update_state();

    let events = handler.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].property("from"), Some("Ready"));
    assert_eq!(events[0].property("to"), Some("Active"));
}

#[test]
fn terminated_members_survive_as_records() {
    let environment = env();
    let composite =
        Composite::create("archive", CompositeType::Standard, &environment).unwrap();
    let member = Component::create("member", &environment).unwrap();
    composite.add_component(member.clone()).unwrap();

    member.terminate();

    // The record stays reachable for lineage and audit.
    let found = composite.component(member.id()).unwrap();
    assert_eq!(found.reason(), "member");
    assert!(found.is_terminated());
}
