//! # tidings-core
//!
//! Core traits for the tidings event bus.
//!
//! This crate has minimal dependencies and is meant to be imported by code
//! that defines events or subscribers without pulling in the dispatch engine.
//!
//! # Building Blocks
//!
//! - [`Event`]: marker trait for anything that can be posted. An event may
//!   declare a parent event, which forms the supertype chain used when a bus
//!   runs with inheritance enabled.
//! - [`EventKind`]: stable per-type key under which handlers are registered.
//! - [`Priority`]: ordering of handlers registered for the same kind.
//! - [`Subscriber`]: a handler bundled with its event type, priority and
//!   filter. Produced by `#[subscribe]` on a plain function.
//! - [`IntoHandlerResult`]: converts handler return values into success or
//!   failure.
//!
//! # Error Types
//!
//! - [`TidingsError`] - Top-level error type
//! - [`DispatchError`] - Handler and forwarding failures during a post
//! - [`ConfigError`] - Bus construction and global initialization errors

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod error;
mod event;
mod priority;
mod response;
mod subscriber;

// Re-exports
pub use error::{BoxError, ConfigError, DispatchError, TidingsError};
pub use event::{Ancestry, AsAny, Event, EventKind};
pub use priority::Priority;
pub use response::IntoHandlerResult;
pub use subscriber::Subscriber;
