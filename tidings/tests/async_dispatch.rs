//! Buses that dispatch on the worker pool.

mod common;

use common::{Ping, leaf};
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    thread,
    time::Duration,
};
use tidings::{
    Bus, BusFlags, DispatchPolicy, HandlerOptions, Priority,
    testing::{CountingHandler, ErrorCollector, OrderRecorder, wait_for},
};

const TIMEOUT: Duration = Duration::from_secs(5);

fn asynchronous() -> Bus {
    Bus::builder().asynchronous(true).build().unwrap()
}

#[test]
fn test_post_returns_before_handler_completes() {
    let bus = asynchronous();
    assert_eq!(bus.policy(), DispatchPolicy::Async);

    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = Mutex::new(release_rx);
    let finished = Arc::new(AtomicBool::new(false));
    let done = Arc::clone(&finished);
    bus.handler(move |_: &Ping| {
        release_rx
            .lock()
            .unwrap()
            .recv_timeout(TIMEOUT)
            .unwrap();
        done.store(true, Ordering::SeqCst);
    });

    bus.post(Ping(1)).unwrap();
    assert!(!finished.load(Ordering::SeqCst));

    release_tx.send(()).unwrap();
    assert!(wait_for(TIMEOUT, || finished.load(Ordering::SeqCst)));
}

#[test]
fn test_handlers_of_one_post_run_in_priority_order() {
    let bus = asynchronous();
    let order = OrderRecorder::new();
    bus.handler_with(
        HandlerOptions::new().with_priority(Priority::Low),
        order.marker::<Ping>(1),
    );
    bus.handler_with(
        HandlerOptions::new().with_priority(Priority::High),
        order.marker::<Ping>(3),
    );
    bus.handler(order.marker::<Ping>(2));

    bus.post(Ping(0)).unwrap();
    assert!(wait_for(TIMEOUT, || order.order().len() == 3));
    assert_eq!(order.order(), vec![3, 2, 1]);
}

#[test]
fn test_handlers_run_off_the_posting_thread() {
    let bus = asynchronous();
    let caller = thread::current().id();
    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    bus.handler(move |_: &Ping| {
        let _ = tx.lock().unwrap().send(thread::current().id());
    });

    bus.post(Ping(1)).unwrap();
    let worker = rx.recv_timeout(TIMEOUT).unwrap();
    assert_ne!(worker, caller);
}

#[test]
fn test_every_post_is_delivered() {
    let bus = asynchronous();
    let counter = CountingHandler::new();
    bus.handler(counter.callback::<Ping>());

    for i in 0..100 {
        bus.post(Ping(i)).unwrap();
    }
    assert!(wait_for(TIMEOUT, || counter.count() == 100));
}

#[test]
fn test_failures_reach_the_sink() {
    let errors = ErrorCollector::new();
    let bus = Bus::builder()
        .asynchronous(true)
        .error_sink(errors.sink())
        .build()
        .unwrap();
    bus.handler(|_: &Ping| -> Result<(), &'static str> { Err("async failure") });

    bus.post(Ping(1)).unwrap();
    assert!(wait_for(TIMEOUT, || errors.count() == 1));
}

#[test]
fn test_panicking_filter_reaches_the_sink() {
    let errors = ErrorCollector::new();
    let bus = Bus::builder()
        .asynchronous(true)
        .error_sink(errors.sink())
        .build()
        .unwrap();
    let counter = CountingHandler::new();
    bus.handler_with(
        HandlerOptions::new()
            .with_priority(Priority::High)
            .with_filter(|_: &Ping| -> bool { panic!("filter blew up") }),
        counter.callback::<Ping>(),
    );
    bus.handler(counter.callback::<Ping>());

    bus.post(Ping(1)).unwrap();
    assert!(wait_for(TIMEOUT, || errors.count() == 1 && counter.count() == 1));
    assert_eq!(errors.panics(), 1);
}

#[test]
fn test_post_without_sink_does_not_return_handler_errors() {
    let bus = Bus::builder()
        .asynchronous(true)
        .propagate_errors()
        .build()
        .unwrap();
    let counter = CountingHandler::new();
    bus.handler(|_: &Ping| -> Result<(), &'static str> { Err("lost") });
    bus.handler(counter.callback::<Ping>());

    assert!(bus.post(Ping(1)).is_ok());
    assert!(!wait_for(Duration::from_millis(200), || counter.count() > 0));
}

#[test]
fn test_async_bus_forwards_to_sync_bus_on_caller_thread() {
    let source = asynchronous();
    let target = Bus::new();
    source.forward_to(&target);

    let counter = CountingHandler::new();
    target.handler(counter.callback::<Ping>());

    source.post(Ping(1)).unwrap();
    assert_eq!(counter.count(), 1);
}

#[test]
fn test_async_inheritance() {
    let bus = Bus::builder()
        .flags("async | inheritance".parse::<BusFlags>().unwrap())
        .build()
        .unwrap();
    let order = OrderRecorder::new();
    bus.handler(order.marker::<common::Base>(3));
    bus.handler(order.marker::<common::Leaf>(1));
    bus.handler(order.marker::<common::Mid>(2));

    bus.post(leaf(1)).unwrap();
    assert!(wait_for(TIMEOUT, || order.order().len() == 3));
    assert_eq!(order.order(), vec![1, 2, 3]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_executor_from_host_runtime() {
    let bus = Bus::builder()
        .asynchronous(true)
        .executor(tokio::runtime::Handle::current())
        .build()
        .unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel();
    let tx = Mutex::new(Some(tx));
    bus.handler(move |ping: &Ping| {
        if let Some(tx) = tx.lock().unwrap().take() {
            let _ = tx.send(ping.0);
        }
    });

    bus.post(Ping(11)).unwrap();
    let received = tokio::time::timeout(TIMEOUT, rx).await.unwrap().unwrap();
    assert_eq!(received, 11);
}
