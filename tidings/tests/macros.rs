//! Integration tests for the derive and attribute macros.

#![cfg(feature = "macros")]

use lazy_static::lazy_static;
use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};
use tidings::{Bus, Event, EventKind, Priority, Subscriber};

#[derive(Event, Clone, Debug)]
struct Connected {
    peer: String,
}

#[derive(Event, Clone, Debug)]
struct TlsConnected {
    #[event(parent)]
    base: Connected,
    cipher: &'static str,
}

#[derive(Event)]
struct Wrapped(u8, #[event(parent)] Connected);

#[derive(Event, Debug)]
enum Signal {
    Up,
    Down,
}

lazy_static! {
    static ref SEEN: Mutex<Vec<String>> = Mutex::new(Vec::new());
    static ref ORDER: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());
}

static SIGNALS: AtomicUsize = AtomicUsize::new(0);

#[tidings::subscribe]
fn on_connected(event: &Connected) {
    SEEN.lock().unwrap().push(event.peer.clone());
}

#[tidings::subscribe(priority = High)]
fn first(_event: &TlsConnected) {
    ORDER.lock().unwrap().push("first");
}

#[tidings::subscribe(priority = Lowest)]
fn last(_event: &TlsConnected) {
    ORDER.lock().unwrap().push("last");
}

#[tidings::subscribe]
fn middle(event: &TlsConnected) {
    ORDER.lock().unwrap().push(event.cipher);
}

#[tidings::subscribe(filter = |signal: &Signal| matches!(signal, Signal::Up))]
fn count_up(_signal: &Signal) {
    SIGNALS.fetch_add(1, Ordering::SeqCst);
}

#[deny(unused_variables)]
mod annotated {
    use super::Connected;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub static CALLS: AtomicUsize = AtomicUsize::new(0);

    /// Counts connections without looking at them.
    #[allow(unused_variables)]
    #[tidings::subscribe]
    pub(super) fn count_connections(event: &Connected) {
        CALLS.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug)]
struct Refused;

impl std::fmt::Display for Refused {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("refused")
    }
}

impl std::error::Error for Refused {}

#[tidings::subscribe]
fn refuse(_event: &Wrapped) -> Result<(), Refused> {
    Err(Refused)
}

#[test]
fn test_derive_without_parent() {
    let event = Connected {
        peer: "a".into(),
    };
    let event: &dyn Event = &event;
    assert!(event.parent().is_none());
    assert_eq!(event.kind(), EventKind::of::<Connected>());
}

#[test]
fn test_derive_with_named_parent() {
    let event = TlsConnected {
        base: Connected {
            peer: "b".into(),
        },
        cipher: "aes",
    };
    let event: &dyn Event = &event;
    let parent = event.parent().unwrap();
    assert_eq!(parent.downcast_ref::<Connected>().unwrap().peer, "b");
}

#[test]
fn test_derive_with_tuple_parent() {
    let event = Wrapped(
        1,
        Connected {
            peer: "c".into(),
        },
    );
    assert_eq!(event.0, 1);
    let event: &dyn Event = &event;
    assert!(event.parent().unwrap().is::<Connected>());
    assert_eq!(event.downcast_ref::<Wrapped>().unwrap().0, 1);
}

#[test]
fn test_subscriber_metadata() {
    assert_eq!(<first as Subscriber>::PRIORITY, Priority::High);
    assert_eq!(<last as Subscriber>::PRIORITY, Priority::Lowest);
    assert_eq!(<middle as Subscriber>::PRIORITY, Priority::Normal);
    assert!(count_up.accepts(&Signal::Up));
    assert!(!count_up.accepts(&Signal::Down));
}

#[test]
fn test_subscribed_functions_run_in_priority_order() {
    let bus = Bus::new();
    bus.subscribe(last);
    bus.subscribe(middle);
    bus.subscribe(first);

    bus.post(TlsConnected {
        base: Connected {
            peer: "d".into(),
        },
        cipher: "chacha",
    })
    .unwrap();
    assert_eq!(*ORDER.lock().unwrap(), vec!["first", "chacha", "last"]);
}

#[test]
fn test_subscribed_function_receives_inherited_events() {
    let bus = Bus::builder().inheritance(true).build().unwrap();
    bus.subscribe(on_connected);

    bus.post(Wrapped(
        2,
        Connected {
            peer: "e".into(),
        },
    ))
    .unwrap();
    assert!(SEEN.lock().unwrap().contains(&"e".to_owned()));
}

#[test]
fn test_subscribed_filter() {
    let bus = Bus::new();
    let handle = bus.subscribe(count_up);
    assert_eq!(handle.kind(), EventKind::of::<Signal>());

    bus.post(Signal::Up).unwrap();
    bus.post(Signal::Down).unwrap();
    bus.post(Signal::Up).unwrap();
    assert_eq!(SIGNALS.load(Ordering::SeqCst), 2);
}

#[test]
fn test_subscriber_keeps_function_attributes() {
    let bus = Bus::new();
    bus.subscribe(annotated::count_connections);

    bus.post(Connected {
        peer: "g".into(),
    })
    .unwrap();
    assert_eq!(annotated::CALLS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_subscribed_function_errors_propagate() {
    let bus = Bus::builder().propagate_errors().build().unwrap();
    bus.subscribe(refuse);

    let err = bus
        .post(Wrapped(
            3,
            Connected {
                peer: "f".into(),
            },
        ))
        .unwrap_err();
    assert_eq!(std::error::Error::source(&err).unwrap().to_string(), "refused");
}
