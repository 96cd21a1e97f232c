//! The event bus.
//!
//! A [`Bus`] owns per-kind handler lists and a set of outgoing forwarding
//! edges. Posting an event:
//!
//! 1. resolves the event's kind, plus its parent kinds when
//!    [`BusFlags::INHERITANCE`] is set (full chain to the root),
//! 2. invokes every enabled handler whose filter accepts the event, kind by
//!    kind, in priority order, on the caller's thread or as one unit on the
//!    worker pool,
//! 3. posts the event on every forwarding target whose edge filter accepts it.
//!
//! # Failures
//!
//! A handler fails by returning an error or by panicking, in its callback or
//! in its filter. A panicking edge filter fails the same way. With an error sink
//! (the default logs through `tracing`) the failure is reported and delivery
//! continues with the next handler or edge. Without one
//! ([`BusBuilder::propagate_errors`]) the first failure stops the post and is
//! returned to the caller.
//!
//! # Example
//!
//! ```rust,ignore
//! let bus = Bus::new();
//! let handle = bus.handler(|order: &OrderPlaced| println!("order {}", order.id));
//! bus.post(OrderPlaced { id: 7 })?;
//! handle.disable();
//! ```

use crate::{
    config::{BusFlags, DispatchPolicy},
    forward::{EdgeFilter, ForwardTable},
    pool::WorkerPool,
    registry::{HandlerHandle, HandlerOptions, HandlerRecord, HandlerRegistry, Snapshot},
    sink::{self, ErrorSink, TraceEvent, TraceSink},
};
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};
use tidings_core::{ConfigError, DispatchError, Event, EventKind, IntoHandlerResult, Subscriber};
use tokio::runtime::Handle;

static NEXT_BUS_ID: AtomicUsize = AtomicUsize::new(1);

fn default_name() -> String {
    format!("bus-{}", NEXT_BUS_ID.fetch_add(1, Ordering::Relaxed))
}

/// An in-process event bus.
///
/// Cloning is cheap and yields another handle to the same bus. A bus lives
/// as long as any handle to it, including the ones held by forwarding edges
/// of other buses. Forwarding cycles therefore also keep their buses alive.
#[derive(Clone)]
pub struct Bus {
    inner: Arc<BusInner>,
}

struct BusInner {
    name: String,
    flags: BusFlags,
    registry: HandlerRegistry,
    forwards: ForwardTable,
    error_sink: Option<ErrorSink>,
    trace_sink: TraceSink,
    pool: Option<WorkerPool>,
}

impl Bus {
    /// A synchronous bus with default flags and the logging error sink.
    pub fn new() -> Self {
        BusBuilder::new().assemble(None)
    }

    /// A synchronous bus with default flags and the given name.
    pub fn named(name: impl Into<String>) -> Self {
        BusBuilder::new().name(name).assemble(None)
    }

    /// Start configuring a bus.
    pub fn builder() -> BusBuilder {
        BusBuilder::new()
    }

    /// The bus name used in diagnostics.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The flags the bus was built with.
    pub fn flags(&self) -> BusFlags {
        self.inner.flags
    }

    /// The dispatch policy, fixed for the bus's lifetime.
    pub fn policy(&self) -> DispatchPolicy {
        self.inner.flags.policy()
    }

    /// Returns `true` if both handles refer to the same bus.
    pub fn same_bus(&self, other: &Bus) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Register a handler with default options.
    ///
    /// The event kind is taken from the callback's parameter type, so
    /// closures need an annotation: `bus.handler(|e: &Ping| ...)`.
    pub fn handler<E, F, R>(&self, callback: F) -> HandlerHandle
    where
        E: Event,
        F: Fn(&E) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        self.handler_with(HandlerOptions::new(), callback)
    }

    /// Register a handler with explicit priority, filter or initial state.
    pub fn handler_with<E, F, R>(&self, options: HandlerOptions<E>, callback: F) -> HandlerHandle
    where
        E: Event,
        F: Fn(&E) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        let (record, handle) = HandlerRecord::new(options, callback);
        self.inner.registry.insert(record);
        #[cfg(feature = "tracing")]
        tracing::debug!(
            bus = self.name(),
            kind = %handle.kind(),
            priority = %handle.priority(),
            handler = handle.id(),
            "handler registered"
        );
        handle
    }

    /// Register a function tagged with `#[subscribe]`.
    pub fn subscribe<S: Subscriber>(&self, subscriber: S) -> HandlerHandle {
        let subscriber = Arc::new(subscriber);
        let gate = Arc::clone(&subscriber);
        self.handler_with(
            HandlerOptions::new()
                .with_priority(S::PRIORITY)
                .with_filter(move |event: &S::Event| gate.accepts(event)),
            move |event: &S::Event| subscriber.handle(event),
        )
    }

    /// Remove the handler behind `handle`. Returns `false` if it is not
    /// registered on this bus.
    pub fn unregister(&self, handle: &HandlerHandle) -> bool {
        self.inner.registry.remove(handle.kind(), handle.id())
    }

    /// Remove every handler registered for `E`, returning how many there were.
    pub fn unregister_all<E: Event>(&self) -> usize {
        let removed = self.inner.registry.clear(EventKind::of::<E>());
        #[cfg(feature = "tracing")]
        tracing::debug!(bus = self.name(), kind = %EventKind::of::<E>(), removed, "handlers cleared");
        removed
    }

    /// Number of handlers registered for `E`, enabled or not.
    pub fn handler_count<E: Event>(&self) -> usize {
        self.inner.registry.len(EventKind::of::<E>())
    }

    /// Returns `true` if any handler is registered for `E`.
    pub fn has_handlers<E: Event>(&self) -> bool {
        self.handler_count::<E>() > 0
    }

    // ------------------------------------------------------------------
    // Posting
    // ------------------------------------------------------------------

    /// Post an event.
    ///
    /// On a synchronous bus every handler, and every forwarded bus, has run
    /// when this returns. On an asynchronous bus local handlers are only
    /// submitted. `Err` is only returned by buses without an error sink.
    pub fn post<E: Event>(&self, event: E) -> Result<(), DispatchError> {
        self.post_shared(Arc::new(event))
    }

    /// Post an event the caller keeps a reference to, e.g. to read edits
    /// handlers made through interior mutability.
    pub fn post_shared<E: Event>(&self, event: Arc<E>) -> Result<(), DispatchError> {
        self.post_dyn(event)
    }

    /// Post a type-erased event.
    pub fn post_dyn(&self, event: Arc<dyn Event>) -> Result<(), DispatchError> {
        let target: &dyn Event = &*event;
        self.trace(TraceEvent::Posted {
            bus: self.name(),
            kind: target.kind(),
        });

        let plan = self.resolve(target);
        match &self.inner.pool {
            None => self.deliver(target, &plan)?,
            Some(pool) if plan.iter().any(Option::is_some) => {
                let bus = self.clone();
                let event = Arc::clone(&event);
                pool.submit(move || {
                    if let Err(error) = bus.deliver(&*event, &plan) {
                        #[cfg(feature = "tracing")]
                        {
                            tracing::error!(
                                bus = bus.name(),
                                kind = %error.kind(),
                                "{error}; bus has no error sink"
                            );
                        }
                        #[cfg(not(feature = "tracing"))]
                        {
                            let _ = error;
                        }
                    }
                });
            }
            Some(_) => {}
        }

        self.forward_event(&event)
    }

    /// The handler snapshots to run for `event`, one per level of its chain.
    fn resolve(&self, event: &dyn Event) -> Vec<Option<Snapshot>> {
        let registry = &self.inner.registry;
        if self.inner.flags.contains(BusFlags::INHERITANCE) {
            event
                .ancestry()
                .map(|level| registry.snapshot(level.kind()))
                .collect()
        } else {
            vec![registry.snapshot(event.kind())]
        }
    }

    fn deliver(&self, event: &dyn Event, plan: &[Option<Snapshot>]) -> Result<(), DispatchError> {
        let filtering = self.inner.flags.contains(BusFlags::FILTERING);
        for (level, snapshot) in event.ancestry().zip(plan) {
            let Some(snapshot) = snapshot else {
                continue;
            };
            for record in snapshot.iter() {
                match record.accepts(level, filtering) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(error) => {
                        self.report(error)?;
                        continue;
                    }
                }
                self.trace(TraceEvent::Dispatched {
                    bus: self.name(),
                    kind: level.kind(),
                    priority: record.priority(),
                    handler: record.id(),
                });
                if let Err(error) = record.invoke(level) {
                    self.report(error)?;
                }
            }
        }
        Ok(())
    }

    fn forward_event(&self, event: &Arc<dyn Event>) -> Result<(), DispatchError> {
        let edges = self.inner.forwards.snapshot();
        for edge in edges.iter() {
            let target = edge.target();
            match edge.accepts(&**event) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(error) => {
                    self.report(DispatchError::Forwarded {
                        target: target.name().to_owned(),
                        source: Box::new(error),
                    })?;
                    continue;
                }
            }
            self.trace(TraceEvent::Forwarded {
                from: self.name(),
                to: target.name(),
                kind: (**event).kind(),
            });
            if let Err(error) = target.post_dyn(Arc::clone(event)) {
                self.report(DispatchError::Forwarded {
                    target: target.name().to_owned(),
                    source: Box::new(error),
                })?;
            }
        }
        Ok(())
    }

    /// Hand `error` to the sink, or give it back when there is none.
    fn report(&self, error: DispatchError) -> Result<(), DispatchError> {
        match &self.inner.error_sink {
            Some(sink) => {
                sink(&error);
                Ok(())
            }
            None => Err(error),
        }
    }

    fn trace(&self, event: TraceEvent<'_>) {
        if self.inner.flags.contains(BusFlags::TRACING) {
            (self.inner.trace_sink)(&event);
        }
    }

    // ------------------------------------------------------------------
    // Forwarding
    // ------------------------------------------------------------------

    /// Forward every event posted here to `target`. Returns `target`.
    ///
    /// Cycles are not detected: a bus that reaches itself through its edges
    /// recurses until the stack overflows.
    pub fn forward_to(&self, target: &Bus) -> Bus {
        self.add_forward(target, None)
    }

    /// Forward events accepted by `filter` to `target`. Returns `target`.
    pub fn forward_to_filtered<F>(&self, target: &Bus, filter: F) -> Bus
    where
        F: Fn(&dyn Event) -> bool + Send + Sync + 'static,
    {
        self.add_forward(target, Some(Box::new(filter)))
    }

    /// Create a bus configured like this one and forward everything to it.
    pub fn forward(&self) -> Bus {
        self.forward_to(&self.sibling())
    }

    /// Create a bus configured like this one and forward events accepted by
    /// `filter` to it.
    pub fn forward_filtered<F>(&self, filter: F) -> Bus
    where
        F: Fn(&dyn Event) -> bool + Send + Sync + 'static,
    {
        self.forward_to_filtered(&self.sibling(), filter)
    }

    /// Remove every edge to `target`, returning how many were removed.
    pub fn stop_forwarding(&self, target: &Bus) -> usize {
        let removed = self.inner.forwards.remove(target);
        #[cfg(feature = "tracing")]
        tracing::debug!(from = self.name(), to = target.name(), removed, "forwarding stopped");
        removed
    }

    /// Remove every outgoing edge, returning how many were removed.
    pub fn stop_forwarding_all(&self) -> usize {
        let removed = self.inner.forwards.clear();
        #[cfg(feature = "tracing")]
        tracing::debug!(from = self.name(), removed, "all forwarding stopped");
        removed
    }

    /// Number of outgoing edges.
    pub fn forward_count(&self) -> usize {
        self.inner.forwards.len()
    }

    fn add_forward(&self, target: &Bus, filter: Option<EdgeFilter>) -> Bus {
        self.inner.forwards.add(target.clone(), filter);
        #[cfg(feature = "tracing")]
        tracing::debug!(from = self.name(), to = target.name(), "forwarding edge added");
        target.clone()
    }

    fn sibling(&self) -> Bus {
        Bus {
            inner: Arc::new(BusInner {
                name: default_name(),
                flags: self.inner.flags,
                registry: HandlerRegistry::new(),
                forwards: ForwardTable::new(),
                error_sink: self.inner.error_sink.clone(),
                trace_sink: Arc::clone(&self.inner.trace_sink),
                pool: self.inner.pool.clone(),
            }),
        }
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("name", &self.inner.name)
            .field("flags", &self.inner.flags)
            .field("forwards", &self.forward_count())
            .field("error_sink", &self.inner.error_sink.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for a [`Bus`].
///
/// # Example
/// ```ignore
/// let bus = Bus::builder()
///     .name("orders")
///     .inheritance(true)
///     .asynchronous(true)
///     .error_sink(|err| metrics::failed(err))
///     .build()?;
/// ```
pub struct BusBuilder {
    name: Option<String>,
    flags: BusFlags,
    error_sink: Option<ErrorSink>,
    trace_sink: TraceSink,
    executor: Option<Handle>,
}

impl BusBuilder {
    /// Default configuration: synchronous, filtering on, logging sinks.
    pub fn new() -> Self {
        Self {
            name: None,
            flags: BusFlags::default(),
            error_sink: Some(Arc::new(sink::log_error)),
            trace_sink: Arc::new(sink::log_trace),
            executor: None,
        }
    }

    /// Name used in diagnostics. Defaults to `bus-<n>`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name to use if [`name`](Self::name) is never called.
    pub fn default_name(mut self, name: impl Into<String>) -> Self {
        self.name.get_or_insert_with(|| name.into());
        self
    }

    /// Replace all flags at once.
    pub fn flags(mut self, flags: BusFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Deliver events to handlers of their parent kinds too.
    pub fn inheritance(self, enabled: bool) -> Self {
        self.flag(BusFlags::INHERITANCE, enabled)
    }

    /// Dispatch on the worker pool instead of the posting thread.
    pub fn asynchronous(self, enabled: bool) -> Self {
        self.flag(BusFlags::ASYNC, enabled)
    }

    /// Consult per-handler filters (on by default).
    pub fn filtering(self, enabled: bool) -> Self {
        self.flag(BusFlags::FILTERING, enabled)
    }

    /// Report posts, dispatches and forwards to the trace sink.
    pub fn tracing(self, enabled: bool) -> Self {
        self.flag(BusFlags::TRACING, enabled)
    }

    fn flag(mut self, flag: BusFlags, enabled: bool) -> Self {
        self.flags.set(flag, enabled);
        self
    }

    /// Report handler failures to `sink` and keep dispatching.
    pub fn error_sink<F>(mut self, sink: F) -> Self
    where
        F: Fn(&DispatchError) + Send + Sync + 'static,
    {
        self.error_sink = Some(Arc::new(sink));
        self
    }

    /// Remove the error sink: the first handler failure aborts the post and
    /// is returned from it. Asynchronous buses can only log such failures.
    pub fn propagate_errors(mut self) -> Self {
        self.error_sink = None;
        self
    }

    /// Receive trace records. Only used when tracing is enabled.
    pub fn trace_sink<F>(mut self, sink: F) -> Self
    where
        F: Fn(&TraceEvent<'_>) + Send + Sync + 'static,
    {
        self.trace_sink = Arc::new(sink);
        self
    }

    /// Run asynchronous dispatch on this runtime's blocking pool instead of
    /// the shared one.
    pub fn executor(mut self, handle: Handle) -> Self {
        self.executor = Some(handle);
        self
    }

    /// Build the bus. Fails only if an asynchronous bus needs the shared
    /// worker pool and it cannot be started.
    pub fn build(self) -> Result<Bus, ConfigError> {
        let pool = match self.flags.policy() {
            DispatchPolicy::Sync => None,
            DispatchPolicy::Async => Some(match &self.executor {
                Some(handle) => WorkerPool::from_handle(handle.clone()),
                None => WorkerPool::shared()?,
            }),
        };
        Ok(self.assemble(pool))
    }

    fn assemble(self, pool: Option<WorkerPool>) -> Bus {
        let bus = Bus {
            inner: Arc::new(BusInner {
                name: self.name.unwrap_or_else(default_name),
                flags: self.flags,
                registry: HandlerRegistry::new(),
                forwards: ForwardTable::new(),
                error_sink: self.error_sink,
                trace_sink: self.trace_sink,
                pool,
            }),
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(bus = bus.name(), flags = ?bus.flags(), "bus created");
        bus
    }
}

impl Default for BusBuilder {
    fn default() -> Self {
        Self::new()
    }
}
