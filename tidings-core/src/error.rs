//! Error types for tidings.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`TidingsError`] - Top-level error type for all tidings operations
//! - [`DispatchError`] - Failures raised while delivering a posted event
//! - [`ConfigError`] - Errors constructing buses or the global bus

use crate::event::EventKind;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all tidings operations.
#[derive(Error, Debug)]
pub enum TidingsError {
    /// An error occurred while dispatching an event.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// A bus could not be configured.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

/// Errors raised while delivering a posted event.
///
/// A bus with an error sink hands these to the sink and keeps going. A bus
/// without one returns the first of them from `post`.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A handler returned an error.
    #[error("handler for `{kind}` failed")]
    Handler {
        /// The kind the failing handler was registered for.
        kind: EventKind,
        /// The error returned by the handler.
        #[source]
        source: BoxError,
    },

    /// A handler panicked.
    #[error("handler for `{kind}` panicked: {message}")]
    Panicked {
        /// The kind the failing handler was registered for.
        kind: EventKind,
        /// The panic payload, if it was a string.
        message: String,
    },

    /// A forwarded bus failed to deliver the event.
    #[error("forwarding to bus `{target}` failed")]
    Forwarded {
        /// Name of the bus the event was forwarded to.
        target: String,
        /// The failure reported by that bus.
        #[source]
        source: Box<DispatchError>,
    },
}

impl DispatchError {
    /// The kind of the handler that ultimately failed.
    pub fn kind(&self) -> EventKind {
        match self {
            DispatchError::Handler { kind, .. } | DispatchError::Panicked { kind, .. } => *kind,
            DispatchError::Forwarded { source, .. } => source.kind(),
        }
    }

    /// Returns `true` if the failure was a panic.
    pub fn is_panic(&self) -> bool {
        match self {
            DispatchError::Panicked { .. } => true,
            DispatchError::Handler { .. } => false,
            DispatchError::Forwarded { source, .. } => source.is_panic(),
        }
    }
}

/// Errors that can occur while configuring a bus.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A flag name did not match any bus flag.
    #[error("unknown bus flag: {0:?}")]
    UnknownFlag(String),

    /// The worker pool for asynchronous dispatch could not be started.
    #[error("failed to start dispatch worker pool")]
    WorkerPool(#[source] std::io::Error),

    /// The global bus was already created.
    #[error("global bus is already initialized")]
    GlobalAlreadyInitialized,
}

// Convenience conversions
impl From<BoxError> for TidingsError {
    fn from(err: BoxError) -> Self {
        TidingsError::Custom(err)
    }
}
