//! Per-bus handler registry.
//!
//! Handlers are stored per [`EventKind`] in copy-on-write lists: a
//! registration publishes a new immutable snapshot, and dispatch iterates the
//! snapshot it loaded when it started. A post racing with a registration may
//! or may not see the new handler, but never observes a half-updated list.

use arc_swap::ArcSwap;
use dashmap::DashMap;
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};
use tidings_core::{BoxError, DispatchError, Event, EventKind, IntoHandlerResult, Priority};

type ErasedCallback = Box<dyn Fn(&dyn Event) -> Result<(), BoxError> + Send + Sync>;
type ErasedFilter = Box<dyn Fn(&dyn Event) -> bool + Send + Sync>;
type TypedFilter<E> = Box<dyn Fn(&E) -> bool + Send + Sync>;

/// An immutable, priority-ordered view of one kind's handlers.
pub(crate) type Snapshot = Arc<Vec<Arc<HandlerRecord>>>;

// Ids are unique across buses so a handle can never remove a record on a
// bus it was not issued by.
static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// A handle for toggling a registered handler at runtime.
///
/// Returned by every registration call. Clones share the same flag.
#[derive(Debug, Clone)]
pub struct HandlerHandle {
    id: u64,
    kind: EventKind,
    priority: Priority,
    enabled: Arc<AtomicBool>,
}

impl HandlerHandle {
    /// Check if the handler is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Enable the handler.
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    /// Disable the handler. It stays registered but is skipped by dispatch.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    /// Toggle the enabled state, returning the new state.
    pub fn toggle(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::AcqRel)
    }

    /// Set the enabled state.
    pub fn set(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// The kind the handler was registered for.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// The handler's priority.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Identifier of the handler record.
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Registration options for a handler of `E`.
///
/// # Example
/// ```ignore
/// bus.handler_with(
///     HandlerOptions::new()
///         .with_priority(Priority::High)
///         .with_filter(|order: &Order| order.total > 100),
///     |order: &Order| audit(order),
/// );
/// ```
pub struct HandlerOptions<E> {
    priority: Priority,
    enabled: bool,
    filter: Option<TypedFilter<E>>,
}

impl<E: Event> HandlerOptions<E> {
    /// Default options: `Normal` priority, enabled, accepts every event.
    pub fn new() -> Self {
        Self {
            priority: Priority::Normal,
            enabled: true,
            filter: None,
        }
    }

    /// Set priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Only invoke the handler for events the predicate accepts.
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Set initial enabled state.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

impl<E: Event> Default for HandlerOptions<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// A registered handler, type-erased over its event.
pub(crate) struct HandlerRecord {
    id: u64,
    kind: EventKind,
    priority: Priority,
    enabled: Arc<AtomicBool>,
    filter: Option<ErasedFilter>,
    callback: ErasedCallback,
}

impl HandlerRecord {
    pub(crate) fn new<E, F, R>(options: HandlerOptions<E>, callback: F) -> (Self, HandlerHandle)
    where
        E: Event,
        F: Fn(&E) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        let HandlerOptions {
            priority,
            enabled,
            filter,
        } = options;
        let kind = EventKind::of::<E>();
        let id = NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed);
        let enabled = Arc::new(AtomicBool::new(enabled));

        // Records are keyed by kind, so the downcast only misses if a record
        // is handed an event of another kind, which dispatch never does.
        let callback: ErasedCallback =
            Box::new(move |event: &dyn Event| match event.downcast_ref::<E>() {
                Some(event) => callback(event).into_handler_result(),
                None => Ok(()),
            });
        let filter = filter.map(|filter| -> ErasedFilter {
            Box::new(move |event: &dyn Event| {
                event.downcast_ref::<E>().is_some_and(|e| filter(e))
            })
        });

        let handle = HandlerHandle {
            id,
            kind,
            priority,
            enabled: Arc::clone(&enabled),
        };
        let record = Self {
            id,
            kind,
            priority,
            enabled,
            filter,
            callback,
        };
        (record, handle)
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn priority(&self) -> Priority {
        self.priority
    }

    /// Whether dispatch should invoke this handler for `event`.
    ///
    /// With `filtering` off the handler's filter is not consulted. A filter
    /// that panics fails the handler the same way a panicking callback does.
    pub(crate) fn accepts(&self, event: &dyn Event, filtering: bool) -> Result<bool, DispatchError> {
        if !self.enabled.load(Ordering::Acquire) {
            return Ok(false);
        }
        match self.filter.as_ref() {
            Some(filter) if filtering => catch_panic(self.kind, || filter(event)),
            _ => Ok(true),
        }
    }

    /// Run the callback, turning errors and panics into [`DispatchError`].
    pub(crate) fn invoke(&self, event: &dyn Event) -> Result<(), DispatchError> {
        catch_panic(self.kind, || (self.callback)(event))?.map_err(|source| {
            DispatchError::Handler {
                kind: self.kind,
                source,
            }
        })
    }
}

/// Run user code, reporting a panic as [`DispatchError::Panicked`] for `kind`.
pub(crate) fn catch_panic<T>(kind: EventKind, f: impl FnOnce() -> T) -> Result<T, DispatchError> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| DispatchError::Panicked {
        kind,
        message: panic_message(&*payload),
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

type HandlerList = ArcSwap<Vec<Arc<HandlerRecord>>>;

/// Handler lists of one bus, keyed by event kind.
#[derive(Default)]
pub(crate) struct HandlerRegistry {
    kinds: DashMap<EventKind, Arc<HandlerList>>,
}

impl HandlerRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fetch the list for `kind`, creating it if this is the first handler.
    fn list(&self, kind: EventKind) -> Arc<HandlerList> {
        Arc::clone(
            &self
                .kinds
                .entry(kind)
                .or_insert_with(|| Arc::new(ArcSwap::from_pointee(Vec::new()))),
        )
    }

    /// Append a record and re-sort its list by descending priority.
    ///
    /// The sort is stable, so equal priorities keep registration order.
    pub(crate) fn insert(&self, record: HandlerRecord) {
        let list = self.list(record.kind);
        let record = Arc::new(record);
        list.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(Arc::clone(&record));
            next.sort_by(|a, b| b.priority.cmp(&a.priority));
            next
        });
    }

    /// The current snapshot for `kind`, if any handler was ever registered.
    pub(crate) fn snapshot(&self, kind: EventKind) -> Option<Snapshot> {
        self.kinds.get(&kind).map(|list| list.load_full())
    }

    /// Remove the record with `id` from `kind`'s list.
    pub(crate) fn remove(&self, kind: EventKind, id: u64) -> bool {
        let Some(list) = self.kinds.get(&kind).map(|list| Arc::clone(&list)) else {
            return false;
        };
        let previous = list.rcu(|current| {
            current
                .iter()
                .filter(|record| record.id != id)
                .cloned()
                .collect::<Vec<_>>()
        });
        previous.iter().any(|record| record.id == id)
    }

    /// Drop every record of `kind`, returning how many were removed.
    pub(crate) fn clear(&self, kind: EventKind) -> usize {
        match self.kinds.get(&kind).map(|list| Arc::clone(&list)) {
            Some(list) => list.swap(Arc::new(Vec::new())).len(),
            None => 0,
        }
    }

    /// Number of records registered for `kind`, enabled or not.
    pub(crate) fn len(&self, kind: EventKind) -> usize {
        self.snapshot(kind).map_or(0, |snapshot| snapshot.len())
    }
}
