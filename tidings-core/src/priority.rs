//! Handler priority.

use std::fmt;

/// Ordering of handlers registered for the same event kind.
///
/// Higher priorities run first. Handlers of equal priority run in the order
/// they were registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    /// Runs after every other priority.
    Lowest,
    /// Runs after `Normal`.
    Low,
    /// The default.
    #[default]
    Normal,
    /// Runs before `Normal`.
    High,
    /// Runs before every other priority.
    Highest,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::Lowest => "lowest",
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Highest => "highest",
        };
        f.write_str(name)
    }
}
