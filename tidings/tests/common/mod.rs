#![allow(dead_code)]

use tidings::Event;

// ============================================================================
// Test Event Types
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct Ping(pub u32);

impl Event for Ping {}

#[derive(Clone, Debug, PartialEq)]
pub struct Tick {
    pub label: String,
}

impl Event for Tick {}

/// Root of a three-level hierarchy: `Leaf` embeds `Mid` embeds `Base`.
#[derive(Clone, Debug)]
pub struct Base {
    pub id: u32,
}

impl Event for Base {}

#[derive(Clone, Debug)]
pub struct Mid {
    pub base: Base,
}

impl Event for Mid {
    fn parent(&self) -> Option<&dyn Event> {
        Some(&self.base)
    }
}

#[derive(Clone, Debug)]
pub struct Leaf {
    pub mid: Mid,
}

impl Event for Leaf {
    fn parent(&self) -> Option<&dyn Event> {
        Some(&self.mid)
    }
}

pub fn leaf(id: u32) -> Leaf {
    Leaf {
        mid: Mid { base: Base { id } },
    }
}

