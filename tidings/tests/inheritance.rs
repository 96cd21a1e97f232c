//! Delivering subtype events to supertype handlers.

mod common;

use common::{Base, Leaf, Mid, Ping, leaf};
use tidings::{
    Bus, Event, EventKind, HandlerOptions, Priority,
    testing::{CountingHandler, OrderRecorder},
};

fn inheriting() -> Bus {
    Bus::builder().inheritance(true).build().unwrap()
}

#[test]
fn test_without_inheritance_only_exact_kind_matches() {
    let bus = Bus::new();
    let bases = CountingHandler::new();
    let leaves = CountingHandler::new();
    bus.handler(bases.callback::<Base>());
    bus.handler(leaves.callback::<Leaf>());

    bus.post(leaf(1)).unwrap();
    assert_eq!(bases.count(), 0);
    assert_eq!(leaves.count(), 1);
}

#[test]
fn test_inheritance_reaches_every_ancestor() {
    let bus = inheriting();
    let counter = CountingHandler::new();
    bus.handler(counter.callback::<Leaf>());
    bus.handler(counter.callback::<Mid>());
    bus.handler(counter.callback::<Base>());

    bus.post(leaf(1)).unwrap();
    assert_eq!(counter.count(), 3);
}

#[test]
fn test_most_specific_kind_runs_first() {
    let bus = inheriting();
    let order = OrderRecorder::new();
    bus.handler_with(
        HandlerOptions::new().with_priority(Priority::Highest),
        order.marker::<Base>(3),
    );
    bus.handler_with(
        HandlerOptions::new().with_priority(Priority::Lowest),
        order.marker::<Leaf>(1),
    );
    bus.handler(order.marker::<Mid>(2));

    bus.post(leaf(1)).unwrap();
    assert_eq!(order.order(), vec![1, 2, 3]);
}

#[test]
fn test_supertype_handler_sees_embedded_value() {
    let bus = inheriting();
    let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = std::sync::Arc::clone(&seen);
    bus.handler(move |base: &Base| sink.lock().unwrap().push(base.id));

    bus.post(leaf(42)).unwrap();
    bus.post(Base { id: 7 }).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![42, 7]);
}

#[test]
fn test_posting_a_parent_does_not_reach_child_handlers() {
    let bus = inheriting();
    let leaves = CountingHandler::new();
    bus.handler(leaves.callback::<Leaf>());

    bus.post(Base { id: 1 }).unwrap();
    assert_eq!(leaves.count(), 0);
}

#[test]
fn test_filters_see_the_level_they_were_registered_for() {
    let bus = inheriting();
    let counter = CountingHandler::new();
    bus.handler_with(
        HandlerOptions::new().with_filter(|base: &Base| base.id > 10),
        counter.callback::<Base>(),
    );

    bus.post(leaf(5)).unwrap();
    bus.post(leaf(15)).unwrap();
    assert_eq!(counter.count(), 1);
}

#[test]
fn test_ancestry_lists_full_chain() {
    let event = leaf(1);
    let event: &dyn Event = &event;
    let kinds: Vec<EventKind> = event.ancestry().map(|level| level.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::of::<Leaf>(),
            EventKind::of::<Mid>(),
            EventKind::of::<Base>()
        ]
    );

    let ping = Ping(1);
    let ping: &dyn Event = &ping;
    assert_eq!(ping.ancestry().count(), 1);
}
