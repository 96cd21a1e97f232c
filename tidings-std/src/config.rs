//! Bus configuration flags.

use bitflags::bitflags;
use std::str::FromStr;
use tidings_core::ConfigError;

bitflags! {
    /// Feature switches fixed when a bus is built.
    ///
    /// Flags parse from a `|`- or `,`-separated list of names, case
    /// insensitive, so hosts can read them from their own configuration:
    ///
    /// ```ignore
    /// let flags: BusFlags = "inheritance | async".parse()?;
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BusFlags: u8 {
        /// Deliver events to handlers of their parent kinds as well.
        const INHERITANCE = 1 << 0;
        /// Dispatch on the worker pool instead of the posting thread.
        const ASYNC = 1 << 1;
        /// Consult per-handler filters. When unset, filters are ignored.
        const FILTERING = 1 << 2;
        /// Report posts, dispatches and forwards to the trace sink.
        const TRACING = 1 << 3;
    }
}

impl Default for BusFlags {
    fn default() -> Self {
        BusFlags::FILTERING
    }
}

impl BusFlags {
    /// The dispatch policy these flags select.
    pub fn policy(self) -> DispatchPolicy {
        if self.contains(BusFlags::ASYNC) {
            DispatchPolicy::Async
        } else {
            DispatchPolicy::Sync
        }
    }
}

impl FromStr for BusFlags {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut flags = BusFlags::empty();
        for token in s.split(['|', ',']).map(str::trim) {
            if token.is_empty() || token.eq_ignore_ascii_case("none") {
                continue;
            }
            let flag = BusFlags::from_name(&token.to_ascii_uppercase())
                .ok_or_else(|| ConfigError::UnknownFlag(token.to_owned()))?;
            flags |= flag;
        }
        Ok(flags)
    }
}

/// How a bus runs its handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchPolicy {
    /// Handlers run on the posting thread, in order, before `post` returns.
    Sync,
    /// All handlers for one event run as a single unit on the worker pool;
    /// `post` returns once the unit is submitted.
    Async,
}
