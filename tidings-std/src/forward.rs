//! Forwarding edges between buses.
//!
//! Each bus keeps its outgoing edges in insertion order as a copy-on-write
//! snapshot, like its handler lists. The graph is not checked for cycles: a
//! bus that reaches itself through its edges recurses until the stack is
//! exhausted. Avoiding cycles is the caller's job.

use crate::{bus::Bus, registry::catch_panic};
use arc_swap::ArcSwap;
use std::sync::Arc;
use tidings_core::{DispatchError, Event};

/// Predicate deciding whether an event crosses an edge.
pub(crate) type EdgeFilter = Box<dyn Fn(&dyn Event) -> bool + Send + Sync>;

/// A directed, filtered edge to another bus.
pub(crate) struct ForwardEdge {
    target: Bus,
    filter: Option<EdgeFilter>,
}

impl ForwardEdge {
    pub(crate) fn target(&self) -> &Bus {
        &self.target
    }

    /// Whether `event` crosses this edge. A panicking filter is reported
    /// against the event's kind.
    pub(crate) fn accepts(&self, event: &dyn Event) -> Result<bool, DispatchError> {
        match self.filter.as_ref() {
            Some(filter) => catch_panic(event.kind(), || filter(event)),
            None => Ok(true),
        }
    }
}

/// Outgoing edges of one bus.
pub(crate) struct ForwardTable {
    edges: ArcSwap<Vec<Arc<ForwardEdge>>>,
}

impl ForwardTable {
    pub(crate) fn new() -> Self {
        Self {
            edges: ArcSwap::from_pointee(Vec::new()),
        }
    }

    pub(crate) fn add(&self, target: Bus, filter: Option<EdgeFilter>) {
        let edge = Arc::new(ForwardEdge { target, filter });
        self.edges.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(Arc::clone(&edge));
            next
        });
    }

    /// Remove every edge to `target`, returning how many were removed.
    pub(crate) fn remove(&self, target: &Bus) -> usize {
        let previous = self.edges.rcu(|current| {
            current
                .iter()
                .filter(|edge| !edge.target.same_bus(target))
                .cloned()
                .collect::<Vec<_>>()
        });
        previous
            .iter()
            .filter(|edge| edge.target.same_bus(target))
            .count()
    }

    pub(crate) fn clear(&self) -> usize {
        self.edges.swap(Arc::new(Vec::new())).len()
    }

    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<ForwardEdge>>> {
        self.edges.load_full()
    }

    pub(crate) fn len(&self) -> usize {
        self.edges.load().len()
    }
}
