//! Generation-checked slot handles.
//!
//! A [`SlotHandle`] names one slot of a [`FreelistAllocator`](crate::FreelistAllocator).
//! The slot's generation is bumped every time it is freed, so a handle
//! kept past its element's lifetime (an evicted flock, say) is detected
//! in O(1) instead of aliasing whatever reused the slot.

use std::fmt;

/// Stable name of an allocated slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct SlotHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl SlotHandle {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index within its allocator.
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// Generation of the slot when this handle was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for SlotHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotHandle(idx={}, gen={})", self.index, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        let h = SlotHandle::new(7, 3);
        assert_eq!(h.index(), 7);
        assert_eq!(h.generation(), 3);
        assert_eq!(h.to_string(), "SlotHandle(idx=7, gen=3)");
    }
}
