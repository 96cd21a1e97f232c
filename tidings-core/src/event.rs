//! Event trait and per-type kind identifiers.
//!
//! Rust has no struct inheritance, so a subtype event embeds its supertype
//! value and hands it out through [`Event::parent`]. Walking `parent` from a
//! concrete event yields the supertype chain, most specific first.
//!
//! ```rust,ignore
//! struct Connected { peer: String }
//! impl Event for Connected {}
//!
//! struct TlsConnected { base: Connected, cipher: String }
//! impl Event for TlsConnected {
//!     fn parent(&self) -> Option<&dyn Event> {
//!         Some(&self.base)
//!     }
//! }
//! ```

use std::{
    any::{Any, TypeId},
    fmt,
    hash::{Hash, Hasher},
};

/// Object-safe access to the concrete type behind a `dyn Event`.
///
/// Implemented for every `Any + Send + Sync` type; never implement it by hand.
pub trait AsAny: Any + Send + Sync {
    /// Returns `self` as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns the name of the concrete type.
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A marker trait for values that can be posted on a bus.
///
/// Events are shared by reference with every handler of a post. A handler
/// that needs to edit the event in place does so through interior
/// mutability in the payload; every handler after it, and every forwarded
/// bus, observes the edit.
///
/// # Example
///
/// ```rust,ignore
/// struct UserJoined { id: u64 }
///
/// impl Event for UserJoined {}
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid Event",
    label = "missing `Event` implementation",
    note = "implement `Event` or add `#[derive(Event)]`; events must be `Send + Sync + 'static`"
)]
pub trait Event: AsAny + Send + Sync + 'static {
    /// The supertype value embedded in this event, if any.
    ///
    /// Buses with inheritance enabled also deliver this event to handlers
    /// registered for the parent's kind, then the grandparent's, up to the
    /// root. The chain must terminate.
    fn parent(&self) -> Option<&dyn Event> {
        None
    }
}

impl dyn Event {
    /// The kind of the concrete event behind this reference.
    pub fn kind(&self) -> EventKind {
        EventKind {
            id: self.as_any().type_id(),
            name: AsAny::type_name(self),
        }
    }

    /// Returns `true` if the concrete event is a `T`.
    pub fn is<T: Event>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Downcasts to the concrete event type.
    pub fn downcast_ref<T: Event>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Iterates this event and its parents, most specific first.
    pub fn ancestry(&self) -> Ancestry<'_> {
        Ancestry { next: Some(self) }
    }
}

impl fmt::Debug for dyn Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

/// Iterator over an event's supertype chain. See [`Event::parent`].
pub struct Ancestry<'a> {
    next: Option<&'a dyn Event>,
}

impl<'a> Iterator for Ancestry<'a> {
    type Item = &'a dyn Event;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent();
        Some(current)
    }
}

/// Stable identifier of a concrete event type.
///
/// Equality and hashing use the [`TypeId`] only; the name is kept for
/// diagnostics.
#[derive(Clone, Copy)]
pub struct EventKind {
    id: TypeId,
    name: &'static str,
}

impl EventKind {
    /// The kind of events of type `E`.
    pub fn of<E: Event>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
        }
    }

    /// The Rust type name of the event.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The underlying type id.
    pub fn type_id(&self) -> TypeId {
        self.id
    }
}

impl PartialEq for EventKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventKind {}

impl Hash for EventKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventKind").field(&self.name).finish()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// Common Event implementations
impl Event for () {}
impl Event for String {}
impl Event for &'static str {}

#[cfg(test)]
mod tests {
    use super::*;

    struct Base;
    impl Event for Base {}

    struct Mid {
        base: Base,
    }
    impl Event for Mid {
        fn parent(&self) -> Option<&dyn Event> {
            Some(&self.base)
        }
    }

    struct Leaf {
        mid: Mid,
    }
    impl Event for Leaf {
        fn parent(&self) -> Option<&dyn Event> {
            Some(&self.mid)
        }
    }

    fn leaf() -> Leaf {
        Leaf {
            mid: Mid { base: Base },
        }
    }

    #[test]
    fn test_kind_is_stable_per_type() {
        let a: &dyn Event = &Base;
        let b: &dyn Event = &Base;
        assert_eq!(a.kind(), b.kind());
        assert_eq!(a.kind(), EventKind::of::<Base>());
        assert_ne!(a.kind(), EventKind::of::<Mid>());
    }

    #[test]
    fn test_kind_display_uses_type_name() {
        let kind = EventKind::of::<Base>();
        assert!(kind.to_string().ends_with("Base"));
        assert_eq!(kind.name(), kind.to_string());
    }

    #[test]
    fn test_ancestry_walks_to_root() {
        let event = leaf();
        let event: &dyn Event = &event;
        let kinds: Vec<EventKind> = event.ancestry().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::of::<Leaf>(),
                EventKind::of::<Mid>(),
                EventKind::of::<Base>(),
            ]
        );
    }

    #[test]
    fn test_root_event_has_single_level() {
        let event: &dyn Event = &Base;
        assert_eq!(event.ancestry().count(), 1);
    }

    #[test]
    fn test_downcast() {
        let event = leaf();
        let event: &dyn Event = &event;
        assert!(event.is::<Leaf>());
        assert!(event.downcast_ref::<Mid>().is_none());

        let parent = event.parent().unwrap();
        assert!(parent.downcast_ref::<Mid>().is_some());
    }
}
