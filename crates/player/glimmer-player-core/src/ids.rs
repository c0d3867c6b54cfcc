//! Identifiers and simple allocators for core entities.

use serde::{Deserialize, Serialize};

/// Identifier of a live composition on a display host.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct CompositionId(pub u32);

/// Identifier of an in-flight loader request (scene load or texture reload).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u32);

/// Monotonic allocator for CompositionId and RequestId.
/// Dense indices improve cache locality; IDs are opaque externally.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_composition: u32,
    next_request: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_composition(&mut self) -> CompositionId {
        let id = CompositionId(self.next_composition);
        self.next_composition = self.next_composition.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_request(&mut self) -> RequestId {
        let id = RequestId(self.next_request);
        self.next_request = self.next_request.wrapping_add(1);
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
        assert_eq!(alloc.alloc_composition(), CompositionId(0));
        assert_eq!(alloc.alloc_composition(), CompositionId(1));
        assert_eq!(alloc.alloc_request(), RequestId(0));
        assert_eq!(alloc.alloc_request(), RequestId(1));
    }
}
