//! Fixed-capacity slab with an intrusive free list and live list.
//!
//! [`FreelistAllocator`] owns `capacity` pre-constructed elements. Every
//! slot sits on exactly one of two doubly-linked lists threaded through
//! the slot array by index:
//!
//! ```text
//! free list:  head → s3 → s0 → s7 → …      (LIFO: last freed is reused first)
//! live list:  head → s5 → s1 → s2 → …      (newest allocation first)
//! ```
//!
//! Elements are never dropped or re-created while the allocator lives;
//! `alloc` hands back a slot whose contents the caller re-initialises in
//! place. This keeps the per-frame path free of heap traffic.

use crate::error::ArenaError;
use crate::handle::SlotHandle;

const NIL: u32 = u32::MAX;

#[derive(Debug)]
struct Slot<T> {
    value: T,
    generation: u32,
    live: bool,
    prev: u32,
    next: u32,
}

/// A fixed-capacity pool of reusable `T` values.
#[derive(Debug)]
pub struct FreelistAllocator<T> {
    slots: Vec<Slot<T>>,
    free_head: u32,
    live_head: u32,
    live_count: usize,
}

impl<T> FreelistAllocator<T> {
    /// Build a pool of `capacity` slots, constructing each value with `init`.
    ///
    /// This is the only allocating call. Failure here is fatal for the
    /// owning subsystem.
    pub fn try_new(capacity: usize, mut init: impl FnMut() -> T) -> Result<Self, ArenaError> {
        if capacity == 0 {
            return Err(ArenaError::ZeroCapacity);
        }
        if capacity >= NIL as usize {
            return Err(ArenaError::AllocationFailed {
                requested: capacity,
            });
        }
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| ArenaError::AllocationFailed {
                requested: capacity,
            })?;
        for i in 0..capacity as u32 {
            slots.push(Slot {
                value: init(),
                generation: 0,
                live: false,
                prev: if i == 0 { NIL } else { i - 1 },
                next: if i + 1 == capacity as u32 { NIL } else { i + 1 },
            });
        }
        Ok(Self {
            slots,
            free_head: 0,
            live_head: NIL,
            live_count: 0,
        })
    }

    /// Take a free slot, or `None` when every slot is live.
    ///
    /// The slot keeps whatever value it held when it was last freed; the
    /// caller resets it through [`get_mut`](Self::get_mut).
    pub fn alloc(&mut self) -> Option<SlotHandle> {
        if self.free_head == NIL {
            return None;
        }
        let index = self.free_head;
        self.unlink_free(index);
        self.link_live(index);
        let slot = &mut self.slots[index as usize];
        slot.live = true;
        self.live_count += 1;
        Some(SlotHandle::new(index, slot.generation))
    }

    /// Take a free slot, or recycle the live slot with the smallest key.
    ///
    /// `on_evict` sees the victim's value before its slot is reissued, and
    /// the returned flag tells whether that happened. The victim's handle
    /// goes stale; ties go to the element met first on the live list.
    pub fn alloc_or_evict<K: Ord>(
        &mut self,
        key: impl FnMut(&T) -> K,
        on_evict: impl FnOnce(&mut T),
    ) -> (SlotHandle, bool) {
        if let Some(handle) = self.alloc() {
            return (handle, false);
        }
        // Full with capacity >= 1, so the live list is not empty.
        let victim = self.min_index_by_key(key);
        on_evict(&mut self.slots[victim as usize].value);
        self.unlink_live(victim);
        self.link_live(victim);
        let slot = &mut self.slots[victim as usize];
        slot.generation = slot.generation.wrapping_add(1);
        (SlotHandle::new(victim, slot.generation), true)
    }

    /// Return a live slot to the free list.
    ///
    /// Freeing a stale or foreign handle is caller misuse: it trips a debug
    /// assertion and is otherwise ignored. Returns whether the slot was freed.
    pub fn free(&mut self, handle: SlotHandle) -> bool {
        let owned = self.contains(handle);
        debug_assert!(owned, "free of a handle this allocator does not own: {handle}");
        if !owned {
            return false;
        }
        let index = handle.index;
        self.unlink_live(index);
        self.link_free(index);
        let slot = &mut self.slots[index as usize];
        slot.live = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.live_count -= 1;
        true
    }

    /// Whether `handle` names a slot that is live right now.
    pub fn contains(&self, handle: SlotHandle) -> bool {
        self.slots
            .get(handle.index())
            .is_some_and(|s| s.live && s.generation == handle.generation)
    }

    /// Shared access to a live slot.
    pub fn get(&self, handle: SlotHandle) -> Option<&T> {
        self.slots
            .get(handle.index())
            .filter(|s| s.live && s.generation == handle.generation)
            .map(|s| &s.value)
    }

    /// Exclusive access to a live slot.
    pub fn get_mut(&mut self, handle: SlotHandle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index())
            .filter(|s| s.live && s.generation == handle.generation)
            .map(|s| &mut s.value)
    }

    /// First element of the live list.
    ///
    /// Together with [`next_live`](Self::next_live) this gives a cursor
    /// that survives freeing the current element, as long as the next
    /// handle is fetched before the free.
    pub fn first_live(&self) -> Option<SlotHandle> {
        self.handle_at(self.live_head)
    }

    /// Successor of `handle` on the live list.
    pub fn next_live(&self, handle: SlotHandle) -> Option<SlotHandle> {
        if !self.contains(handle) {
            return None;
        }
        self.handle_at(self.slots[handle.index()].next)
    }

    /// Iterate live elements, newest allocation first.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            allocator: self,
            cursor: self.live_head,
        }
    }

    /// The live element with the smallest key.
    ///
    /// Ties go to the element met first on the live list, which makes the
    /// choice deterministic for a fixed sequence of calls.
    pub fn min_by_key<K: Ord>(&self, key: impl FnMut(&T) -> K) -> Option<SlotHandle> {
        if self.live_head == NIL {
            return None;
        }
        self.handle_at(self.min_index_by_key(key))
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.live_count
    }

    /// Whether no element is live.
    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// Whether every slot is live.
    pub fn is_full(&self) -> bool {
        self.free_head == NIL
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    // ── List plumbing ───────────────────────────────────────────

    /// Requires a non-empty live list.
    fn min_index_by_key<K: Ord>(&self, mut key: impl FnMut(&T) -> K) -> u32 {
        let mut best = self.live_head;
        let mut best_key = key(&self.slots[best as usize].value);
        let mut cursor = self.slots[best as usize].next;
        while cursor != NIL {
            let slot = &self.slots[cursor as usize];
            let k = key(&slot.value);
            if k < best_key {
                best = cursor;
                best_key = k;
            }
            cursor = slot.next;
        }
        best
    }

    fn handle_at(&self, index: u32) -> Option<SlotHandle> {
        if index == NIL {
            return None;
        }
        Some(SlotHandle::new(index, self.slots[index as usize].generation))
    }

    fn unlink_free(&mut self, index: u32) {
        let (prev, next) = self.detach(index);
        if prev == NIL {
            self.free_head = next;
        }
    }

    fn unlink_live(&mut self, index: u32) {
        let (prev, next) = self.detach(index);
        if prev == NIL {
            self.live_head = next;
        }
    }

    fn detach(&mut self, index: u32) -> (u32, u32) {
        let (prev, next) = {
            let s = &self.slots[index as usize];
            (s.prev, s.next)
        };
        if prev != NIL {
            self.slots[prev as usize].next = next;
        }
        if next != NIL {
            self.slots[next as usize].prev = prev;
        }
        let s = &mut self.slots[index as usize];
        s.prev = NIL;
        s.next = NIL;
        (prev, next)
    }

    fn link_free(&mut self, index: u32) {
        let head = self.free_head;
        self.push_front(index, head);
        self.free_head = index;
    }

    fn link_live(&mut self, index: u32) {
        let head = self.live_head;
        self.push_front(index, head);
        self.live_head = index;
    }

    fn push_front(&mut self, index: u32, head: u32) {
        if head != NIL {
            self.slots[head as usize].prev = index;
        }
        let s = &mut self.slots[index as usize];
        s.prev = NIL;
        s.next = head;
    }
}

/// Iterator over `(handle, &value)` of live slots, newest first.
pub struct Iter<'a, T> {
    allocator: &'a FreelistAllocator<T>,
    cursor: u32,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (SlotHandle, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let slot = &self.allocator.slots[self.cursor as usize];
        let handle = SlotHandle::new(self.cursor, slot.generation);
        self.cursor = slot.next;
        Some((handle, &slot.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pool(capacity: usize) -> FreelistAllocator<u32> {
        FreelistAllocator::try_new(capacity, || 0).unwrap()
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = FreelistAllocator::<u8>::try_new(0, || 0).unwrap_err();
        assert_eq!(err, ArenaError::ZeroCapacity);
    }

    #[test]
    fn alloc_until_full_then_none() {
        let mut p = pool(3);
        assert!(p.alloc().is_some());
        assert!(p.alloc().is_some());
        assert!(!p.is_full());
        assert!(p.alloc().is_some());
        assert!(p.is_full());
        assert!(p.alloc().is_none());
        assert_eq!(p.len(), 3);
        assert_eq!(p.capacity(), 3);
    }

    #[test]
    fn free_is_lifo() {
        let mut p = pool(4);
        let a = p.alloc().unwrap();
        let b = p.alloc().unwrap();
        p.free(a);
        p.free(b);
        let c = p.alloc().unwrap();
        assert_eq!(c.index(), b.index());
        let d = p.alloc().unwrap();
        assert_eq!(d.index(), a.index());
    }

    #[test]
    fn stale_handle_is_rejected() {
        let mut p = pool(1);
        let a = p.alloc().unwrap();
        *p.get_mut(a).unwrap() = 7;
        p.free(a);
        let b = p.alloc().unwrap();
        assert_eq!(a.index(), b.index());
        assert_ne!(a, b);
        assert!(p.get(a).is_none());
        assert_eq!(p.get(b), Some(&7));
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "does not own"))]
    fn double_free_is_caught_in_debug() {
        let mut p = pool(2);
        let a = p.alloc().unwrap();
        assert!(p.free(a));
        assert!(!p.free(a));
    }

    #[test]
    fn live_iteration_is_newest_first() {
        let mut p = pool(4);
        for v in 1..=3 {
            let h = p.alloc().unwrap();
            *p.get_mut(h).unwrap() = v;
        }
        let values: Vec<u32> = p.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![3, 2, 1]);
    }

    #[test]
    fn cursor_survives_freeing_current() {
        let mut p = pool(5);
        for v in 0..5 {
            let h = p.alloc().unwrap();
            *p.get_mut(h).unwrap() = v;
        }
        let mut cursor = p.first_live();
        while let Some(h) = cursor {
            cursor = p.next_live(h);
            if p.get(h).is_some_and(|v| v % 2 == 0) {
                p.free(h);
            }
        }
        let mut left: Vec<u32> = p.iter().map(|(_, v)| *v).collect();
        left.sort_unstable();
        assert_eq!(left, vec![1, 3]);
    }

    #[test]
    fn min_by_key_breaks_ties_on_list_order() {
        let mut p = pool(3);
        let mut handles = Vec::new();
        for v in [5, 2, 2] {
            let h = p.alloc().unwrap();
            *p.get_mut(h).unwrap() = v;
            handles.push(h);
        }
        // Newest first: the third allocation is met before the second.
        assert_eq!(p.min_by_key(|v| *v), Some(handles[2]));
    }

    #[test]
    fn alloc_or_evict_recycles_minimum() {
        let mut p = pool(2);
        let (a, evicted) = p.alloc_or_evict(|v| *v, |_| {});
        assert!(!evicted);
        *p.get_mut(a).unwrap() = 9;
        let (b, _) = p.alloc_or_evict(|v| *v, |_| {});
        *p.get_mut(b).unwrap() = 4;

        let mut seen = None;
        let (c, evicted) = p.alloc_or_evict(|v| *v, |v| seen = Some(*v));
        assert!(evicted);
        assert_eq!(seen, Some(4));
        assert_eq!(c.index(), b.index());
        assert!(p.get(b).is_none());
        assert!(p.contains(a) && p.contains(c));
        assert_eq!(p.len(), 2);
        assert_eq!(p.iter().next().map(|(h, _)| h), Some(c));
    }

    proptest! {
        #[test]
        fn lists_stay_consistent(ops in proptest::collection::vec(any::<(bool, u8)>(), 1..200)) {
            let mut p = pool(16);
            let mut live: Vec<SlotHandle> = Vec::new();
            for (is_alloc, pick) in ops {
                if is_alloc {
                    match p.alloc() {
                        Some(h) => live.push(h),
                        None => prop_assert_eq!(live.len(), 16),
                    }
                } else if !live.is_empty() {
                    let h = live.swap_remove(pick as usize % live.len());
                    prop_assert!(p.free(h));
                }
                prop_assert!(p.len() <= p.capacity());
                prop_assert_eq!(p.len(), live.len());
                prop_assert_eq!(p.iter().count(), live.len());
                prop_assert_eq!(p.is_full(), live.len() == 16);
                for h in &live {
                    prop_assert!(p.contains(*h));
                }
            }
        }

        #[test]
        fn min_by_key_finds_minimum(keys in proptest::collection::vec(any::<i64>(), 1..32)) {
            let mut p = FreelistAllocator::try_new(keys.len(), || 0i64).unwrap();
            for k in &keys {
                let h = p.alloc().unwrap();
                *p.get_mut(h).unwrap() = *k;
            }
            let chosen = p.min_by_key(|v| *v).unwrap();
            prop_assert_eq!(*p.get(chosen).unwrap(), *keys.iter().min().unwrap());
        }
    }
}
