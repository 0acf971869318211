//! Identifiers and simple allocators for core entities.

use serde::{Deserialize, Serialize};

/// Index of an input declaration in a `StateMachineDef`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct InputId(pub u32);

/// Index of a timeline in a `StateMachineDef`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TimelineIdx(pub u32);

/// Index of a state within one layer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct StateIdx(pub u32);

/// Identifier of an artboard component.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ComponentId(pub u32);

/// Monotonic allocator for ComponentId.
/// Dense indices improve cache locality; IDs are opaque externally.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_component: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_component(&mut self) -> ComponentId {
        let id = ComponentId(self.next_component);
        self.next_component = self.next_component.wrapping_add(1);
        id
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_monotonic() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.alloc_component(), ComponentId(0));
        assert_eq!(alloc.alloc_component(), ComponentId(1));
        alloc.reset();
        assert_eq!(alloc.alloc_component(), ComponentId(0));
    }
}
