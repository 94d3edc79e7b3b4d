//! Pool of reusable scratch objects lent out through RAII leases.
//!
//! Collision shape lists are the main client: every live flock and hull
//! borrows one for its whole lifetime. A [`ScratchLease`] puts its object
//! back into the pool when dropped, so eviction, early returns and panics
//! can never leak a scratch object.

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use crate::error::ArenaError;

/// A fixed set of pre-built `S` values.
///
/// Cloning the pool is cheap and yields another handle to the same set.
#[derive(Debug)]
pub struct ScratchPool<S> {
    free: Rc<RefCell<Vec<S>>>,
    capacity: usize,
}

impl<S> Clone for ScratchPool<S> {
    fn clone(&self) -> Self {
        Self {
            free: Rc::clone(&self.free),
            capacity: self.capacity,
        }
    }
}

impl<S: Default> ScratchPool<S> {
    /// Build `capacity` objects up front with `make`.
    ///
    /// Construction failure of any object aborts the whole pool.
    pub fn try_new<E>(capacity: usize, mut make: impl FnMut() -> Result<S, E>) -> Result<Self, E>
    where
        E: From<ArenaError>,
    {
        if capacity == 0 {
            return Err(ArenaError::ZeroCapacity.into());
        }
        let mut items = Vec::new();
        items
            .try_reserve_exact(capacity)
            .map_err(|_| ArenaError::AllocationFailed {
                requested: capacity,
            })?;
        for _ in 0..capacity {
            items.push(make()?);
        }
        Ok(Self {
            free: Rc::new(RefCell::new(items)),
            capacity,
        })
    }

    /// Borrow one object, or `None` if all are lent out.
    pub fn acquire(&self) -> Option<ScratchLease<S>> {
        let item = self.free.borrow_mut().pop()?;
        Some(ScratchLease {
            item,
            home: Rc::clone(&self.free),
        })
    }

    /// Objects currently available.
    pub fn available(&self) -> usize {
        self.free.borrow().len()
    }

    /// Total objects owned by the pool.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Exclusive loan of one scratch object; returned to its pool on drop.
#[derive(Debug)]
#[must_use]
pub struct ScratchLease<S: Default> {
    item: S,
    home: Rc<RefCell<Vec<S>>>,
}

impl<S: Default> Deref for ScratchLease<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.item
    }
}

impl<S: Default> DerefMut for ScratchLease<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.item
    }
}

impl<S: Default> Drop for ScratchLease<S> {
    fn drop(&mut self) {
        let item = std::mem::take(&mut self.item);
        self.home.borrow_mut().push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(n: usize) -> ScratchPool<Vec<u32>> {
        ScratchPool::try_new::<ArenaError>(n, || Ok(Vec::with_capacity(8))).unwrap()
    }

    #[test]
    fn lease_returns_on_drop() {
        let p = pool(2);
        let a = p.acquire().unwrap();
        let b = p.acquire().unwrap();
        assert_eq!(p.available(), 0);
        assert!(p.acquire().is_none());
        drop(a);
        assert_eq!(p.available(), 1);
        drop(b);
        assert_eq!(p.available(), 2);
    }

    #[test]
    fn returned_object_keeps_its_storage() {
        let p = pool(1);
        {
            let mut lease = p.acquire().unwrap();
            lease.extend([1, 2, 3]);
        }
        let lease = p.acquire().unwrap();
        assert_eq!(lease.as_slice(), &[1, 2, 3]);
        assert!(lease.capacity() >= 8);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = ScratchPool::<Vec<u8>>::try_new::<ArenaError>(0, || Ok(Vec::new())).unwrap_err();
        assert_eq!(err, ArenaError::ZeroCapacity);
    }

    #[test]
    fn construction_error_propagates() {
        #[derive(Debug, PartialEq)]
        enum MakeError {
            Arena,
            Failed,
        }
        impl From<ArenaError> for MakeError {
            fn from(_: ArenaError) -> Self {
                MakeError::Arena
            }
        }
        let mut n = 0;
        let err = ScratchPool::<Vec<u8>>::try_new(4, || {
            n += 1;
            if n == 3 {
                Err(MakeError::Failed)
            } else {
                Ok(Vec::new())
            }
        })
        .unwrap_err();
        assert_eq!(err, MakeError::Failed);
    }

    #[test]
    fn lease_outlives_pool_handle() {
        let p = pool(1);
        let lease = p.acquire().unwrap();
        let clone = p.clone();
        drop(p);
        drop(lease);
        assert_eq!(clone.available(), 1);
    }
}
