//! # tidings - In-Process Event Bus
//!
//! Components post typed events on a [`Bus`]; handlers registered for the
//! event's type run in priority order. Buses can forward events to each
//! other, deliver subtype events to supertype handlers, and run handlers on
//! a worker pool instead of the posting thread.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tidings::prelude::*;
//!
//! #[derive(Event)]
//! struct OrderPlaced { id: u64 }
//!
//! let bus = Bus::new();
//! bus.handler_with(
//!     HandlerOptions::new().with_priority(Priority::High),
//!     |order: &OrderPlaced| println!("placed {}", order.id),
//! );
//! bus.post(OrderPlaced { id: 7 })?;
//! ```
//!
//! ## Tagged Functions
//!
//! ```rust,ignore
//! #[tidings::subscribe(priority = Low, filter = |o: &OrderPlaced| o.id != 0)]
//! fn audit(order: &OrderPlaced) {
//!     println!("audit {}", order.id);
//! }
//!
//! tidings::global().subscribe(audit);
//! ```
//!
//! ## Configuration
//!
//! Flags are fixed when a bus is built and can be parsed from host
//! configuration:
//!
//! ```rust,ignore
//! let flags: BusFlags = "inheritance | async".parse()?;
//! let bus = Bus::builder().flags(flags).build()?;
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use tidings_core::{
    // Events
    Ancestry,
    AsAny,
    // Errors
    BoxError,
    ConfigError,
    DispatchError,
    Event,
    EventKind,
    // Handlers
    IntoHandlerResult,
    Priority,
    Subscriber,
    TidingsError,
};

pub use tidings_std::{
    Bus, BusBuilder, BusFlags, DispatchPolicy, ErrorSink, HandlerHandle, HandlerOptions,
    TraceEvent, TraceSink, WorkerPool, log_error, log_trace, testing,
};

#[cfg(feature = "macros")]
pub use tidings_macros::{Event, subscribe};

mod global;

pub use global::{global, init_global};

/// Common imports.
pub mod prelude {
    pub use crate::{
        Bus, BusBuilder, BusFlags, DispatchError, Event, HandlerHandle, HandlerOptions, Priority,
        Subscriber,
    };

    #[cfg(feature = "macros")]
    pub use crate::subscribe;
}
