//! Worker pool for asynchronous dispatch.
//!
//! Units of work run on tokio's blocking pool: threads are spawned on demand,
//! reused while idle and reaped after the keep-alive. There is no queue
//! bound and no way to withdraw a submitted unit.

use std::{
    sync::{Mutex, PoisonError},
    time::Duration,
};
use tidings_core::ConfigError;
use tokio::runtime::{Builder, Handle, Runtime};

// tokio needs a finite cap; this is far above any sane thread count.
const MAX_POOL_THREADS: usize = 1 << 16;
const THREAD_KEEP_ALIVE: Duration = Duration::from_secs(60);

static SHARED_RUNTIME: Mutex<Option<Runtime>> = Mutex::new(None);

/// Executes dispatch units off the posting thread.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    handle: Handle,
}

impl WorkerPool {
    /// The process-wide pool, started on first use.
    pub fn shared() -> Result<Self, ConfigError> {
        let mut runtime = SHARED_RUNTIME
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(runtime) = runtime.as_ref() {
            return Ok(Self::from_handle(runtime.handle().clone()));
        }

        let started = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(MAX_POOL_THREADS)
            .thread_keep_alive(THREAD_KEEP_ALIVE)
            .thread_name("tidings-dispatch")
            .build()
            .map_err(ConfigError::WorkerPool)?;
        #[cfg(feature = "tracing")]
        tracing::debug!("started shared dispatch worker pool");
        let handle = started.handle().clone();
        *runtime = Some(started);
        Ok(Self::from_handle(handle))
    }

    /// A pool backed by the blocking pool of an existing runtime.
    pub fn from_handle(handle: Handle) -> Self {
        Self { handle }
    }

    /// Submit a unit of work. Returns without waiting for it to run.
    pub fn submit<F>(&self, unit: F)
    where
        F: FnOnce() + Send + 'static,
    {
        // Detached: the join handle is dropped, the unit still runs.
        drop(self.handle.spawn_blocking(unit));
    }
}
