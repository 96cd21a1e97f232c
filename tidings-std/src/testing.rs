//! Testing utilities for tidings.
//!
//! Helpers to observe what a bus delivered, in which order, and what it
//! reported to its sinks.
//!
//! # Features
//!
//! - [`RecordingHandler`]: records every event it receives
//! - [`CountingHandler`]: counts invocations
//! - [`OrderRecorder`]: records which handler ran when
//! - [`ErrorCollector`]: an error sink that keeps failure messages
//! - [`TraceCollector`]: a trace sink that keeps owned trace records
//! - [`wait_for`]: polls a condition, for asynchronous buses

use crate::sink::TraceEvent;
use std::{
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::{Duration, Instant},
};
use tidings_core::{DispatchError, Event, EventKind, Priority};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Recording Handler
// ============================================================================

/// A handler that records clones of the events it receives.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = RecordingHandler::<Ping>::new();
/// bus.handler(recorder.callback());
///
/// bus.post(Ping(1))?;
/// assert_eq!(recorder.count(), 1);
/// ```
pub struct RecordingHandler<E: Clone> {
    events: Arc<Mutex<Vec<E>>>,
}

impl<E: Event + Clone> RecordingHandler<E> {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A callback to register on a bus.
    pub fn callback(&self) -> impl Fn(&E) + Send + Sync + 'static {
        let events = Arc::clone(&self.events);
        move |event: &E| lock(&events).push(event.clone())
    }

    /// Get a clone of the recorded events.
    pub fn events(&self) -> Vec<E> {
        lock(&self.events).clone()
    }

    /// Get the number of recorded events.
    pub fn count(&self) -> usize {
        lock(&self.events).len()
    }

    /// Clear all recorded events.
    pub fn clear(&self) {
        lock(&self.events).clear();
    }
}

impl<E: Event + Clone> Default for RecordingHandler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone> Clone for RecordingHandler<E> {
    fn clone(&self) -> Self {
        Self {
            events: Arc::clone(&self.events),
        }
    }
}

// ============================================================================
// Counting Handler
// ============================================================================

/// A handler that counts invocations.
#[derive(Clone, Default)]
pub struct CountingHandler {
    count: Arc<AtomicUsize>,
}

impl CountingHandler {
    /// Create a new counting handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback for events of `E`.
    pub fn callback<E: Event>(&self) -> impl Fn(&E) + Send + Sync + 'static {
        let count = Arc::clone(&self.count);
        move |_: &E| {
            count.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Get the current count.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Reset the counter.
    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }
}

// ============================================================================
// Order Recorder
// ============================================================================

/// Records the ids of handlers in the order they ran.
///
/// ```rust,ignore
/// let order = OrderRecorder::new();
/// bus.handler_with(HandlerOptions::new().with_priority(Priority::Low), order.marker::<Ping>(1));
/// bus.handler_with(HandlerOptions::new().with_priority(Priority::High), order.marker::<Ping>(3));
/// bus.post(Ping)?;
/// assert_eq!(order.order(), vec![3, 1]);
/// ```
#[derive(Clone, Default)]
pub struct OrderRecorder {
    order: Arc<Mutex<Vec<u32>>>,
}

impl OrderRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback for events of `E` that appends `id` when it runs.
    pub fn marker<E: Event>(&self, id: u32) -> impl Fn(&E) + Send + Sync + 'static {
        let order = Arc::clone(&self.order);
        move |_: &E| lock(&order).push(id)
    }

    /// The recorded ids.
    pub fn order(&self) -> Vec<u32> {
        lock(&self.order).clone()
    }
}

// ============================================================================
// Sinks
// ============================================================================

/// An error sink that keeps the messages and kinds of reported failures.
#[derive(Clone, Default)]
pub struct ErrorCollector {
    errors: Arc<Mutex<Vec<(EventKind, String, bool)>>>,
}

impl ErrorCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// The sink to pass to `BusBuilder::error_sink`.
    pub fn sink(&self) -> impl Fn(&DispatchError) + Send + Sync + 'static {
        let errors = Arc::clone(&self.errors);
        move |error: &DispatchError| {
            lock(&errors).push((error.kind(), error.to_string(), error.is_panic()));
        }
    }

    /// Messages of the reported failures, in report order.
    pub fn messages(&self) -> Vec<String> {
        lock(&self.errors)
            .iter()
            .map(|(_, message, _)| message.clone())
            .collect()
    }

    /// Kinds of the handlers that failed.
    pub fn kinds(&self) -> Vec<EventKind> {
        lock(&self.errors).iter().map(|(kind, _, _)| *kind).collect()
    }

    /// Number of reported panics.
    pub fn panics(&self) -> usize {
        lock(&self.errors).iter().filter(|(_, _, panic)| *panic).count()
    }

    /// Number of reported failures.
    pub fn count(&self) -> usize {
        lock(&self.errors).len()
    }
}

/// An owned copy of a [`TraceEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceRecord {
    /// See [`TraceEvent::Posted`].
    Posted {
        /// Name of the bus.
        bus: String,
        /// Kind of the posted event.
        kind: EventKind,
    },
    /// See [`TraceEvent::Dispatched`].
    Dispatched {
        /// Name of the bus.
        bus: String,
        /// Kind the handler was registered for.
        kind: EventKind,
        /// The handler's priority.
        priority: Priority,
    },
    /// See [`TraceEvent::Forwarded`].
    Forwarded {
        /// Name of the forwarding bus.
        from: String,
        /// Name of the receiving bus.
        to: String,
    },
}

impl From<&TraceEvent<'_>> for TraceRecord {
    fn from(event: &TraceEvent<'_>) -> Self {
        match *event {
            TraceEvent::Posted { bus, kind } => TraceRecord::Posted {
                bus: bus.to_owned(),
                kind,
            },
            TraceEvent::Dispatched {
                bus,
                kind,
                priority,
                ..
            } => TraceRecord::Dispatched {
                bus: bus.to_owned(),
                kind,
                priority,
            },
            TraceEvent::Forwarded { from, to, .. } => TraceRecord::Forwarded {
                from: from.to_owned(),
                to: to.to_owned(),
            },
        }
    }
}

/// A trace sink that keeps every record it receives.
#[derive(Clone, Default)]
pub struct TraceCollector {
    records: Arc<Mutex<Vec<TraceRecord>>>,
}

impl TraceCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// The sink to pass to `BusBuilder::trace_sink`.
    pub fn sink(&self) -> impl Fn(&TraceEvent<'_>) + Send + Sync + 'static {
        let records = Arc::clone(&self.records);
        move |event: &TraceEvent<'_>| lock(&records).push(TraceRecord::from(event))
    }

    /// The collected records.
    pub fn records(&self) -> Vec<TraceRecord> {
        lock(&self.records).clone()
    }
}

// ============================================================================
// Waiting
// ============================================================================

/// Poll `condition` until it holds or `timeout` elapses.
///
/// Returns whether the condition held.
pub fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
}
