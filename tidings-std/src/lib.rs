//! # tidings-std
//!
//! Dispatch engine for the tidings event bus.
//!
//! This crate provides:
//! - **Buses**: [`Bus`] and [`BusBuilder`]
//! - **Configuration**: [`BusFlags`], [`DispatchPolicy`]
//! - **Registration**: [`HandlerOptions`], [`HandlerHandle`]
//! - **Side channels**: error and trace sinks
//! - **Asynchronous dispatch**: [`WorkerPool`]
//! - **Test helpers**: [`testing`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use tidings_core;

// Modules
pub mod bus;
pub mod config;
mod forward;
pub mod pool;
pub mod registry;
pub mod sink;
pub mod testing;

pub use bus::{Bus, BusBuilder};
pub use config::{BusFlags, DispatchPolicy};
pub use pool::WorkerPool;
pub use registry::{HandlerHandle, HandlerOptions};
pub use sink::{ErrorSink, TraceEvent, TraceSink, log_error, log_trace};
