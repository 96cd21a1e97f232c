//! Error and trace side channels of a bus.

use std::sync::Arc;
use tidings_core::{DispatchError, EventKind, Priority};

/// Receives handler failures a bus captured instead of returning them.
pub type ErrorSink = Arc<dyn Fn(&DispatchError) + Send + Sync>;

/// Receives diagnostic records from buses built with `BusFlags::TRACING`.
pub type TraceSink = Arc<dyn Fn(&TraceEvent<'_>) + Send + Sync>;

/// A diagnostic record emitted while an event moves through a bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent<'a> {
    /// An event was posted on `bus`.
    Posted {
        /// Name of the bus.
        bus: &'a str,
        /// Kind of the posted event.
        kind: EventKind,
    },
    /// A handler is about to run.
    Dispatched {
        /// Name of the bus.
        bus: &'a str,
        /// Kind the handler was registered for. Differs from the posted
        /// kind when the event reached a parent kind's handler.
        kind: EventKind,
        /// The handler's priority.
        priority: Priority,
        /// The handler's id.
        handler: u64,
    },
    /// An event passed an edge filter and is being posted on `to`.
    Forwarded {
        /// Name of the forwarding bus.
        from: &'a str,
        /// Name of the receiving bus.
        to: &'a str,
        /// Kind of the forwarded event.
        kind: EventKind,
    },
}

/// The default error sink: logs the failure and its source chain.
///
/// Without the `tracing` feature the failure is dropped.
pub fn log_error(error: &DispatchError) {
    #[cfg(feature = "tracing")]
    {
        let source = std::error::Error::source(error).map(ToString::to_string);
        tracing::error!(
            kind = %error.kind(),
            panic = error.is_panic(),
            source = source.as_deref().unwrap_or(""),
            "{error}"
        );
    }
    #[cfg(not(feature = "tracing"))]
    {
        let _ = error;
    }
}

/// The default trace sink: emits a `TRACE` level record per event.
///
/// A no-op without the `tracing` feature.
pub fn log_trace(event: &TraceEvent<'_>) {
    #[cfg(feature = "tracing")]
    {
        match event {
            TraceEvent::Posted { bus, kind } => {
                tracing::trace!(bus, %kind, "event posted");
            }
            TraceEvent::Dispatched {
                bus,
                kind,
                priority,
                handler,
            } => {
                tracing::trace!(bus, %kind, %priority, handler, "dispatching to handler");
            }
            TraceEvent::Forwarded { from, to, kind } => {
                tracing::trace!(from, to, %kind, "event forwarded");
            }
        }
    }
    #[cfg(not(feature = "tracing"))]
    {
        let _ = event;
    }
}
