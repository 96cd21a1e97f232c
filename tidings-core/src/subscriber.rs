//! Tagged handler functions.

use crate::{event::Event, priority::Priority, response::IntoHandlerResult};

/// A handler that carries its own event type, priority and filter.
///
/// This is what `#[subscribe]` generates from a plain function, and the only
/// thing `Bus::subscribe` accepts. Passing an untagged function is rejected
/// at compile time.
///
/// # Example
///
/// ```rust,ignore
/// #[tidings::subscribe(priority = High, filter = |e: &Order| e.total > 100)]
/// fn audit_large_order(event: &Order) {
///     println!("large order {}", event.id);
/// }
///
/// bus.subscribe(audit_large_order);
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a subscriber",
    label = "untagged handler",
    note = "annotate the function with `#[tidings::subscribe]`, or register a closure with `Bus::handler`"
)]
pub trait Subscriber: Send + Sync + 'static {
    /// The event kind this subscriber is registered for.
    type Event: Event;

    /// What the handler body returns.
    type Output: IntoHandlerResult;

    /// Dispatch priority.
    const PRIORITY: Priority = Priority::Normal;

    /// Filter consulted before [`handle`](Subscriber::handle).
    fn accepts(&self, _event: &Self::Event) -> bool {
        true
    }

    /// The handler body.
    fn handle(&self, event: &Self::Event) -> Self::Output;
}
