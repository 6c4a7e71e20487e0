use std::ptr::NonNull;

use crate::{error::AllocError, free_list::FreeListAllocator};

/// Typed allocation contract for containers that must not depend on a
/// particular allocator.
///
/// A container written against `A: PoolAllocator` can store `A::Value`
/// directly, or build an allocator for its own node type with
/// [`rebind`](Self::rebind) while keeping the caller's sizing and backing
/// policy.
pub trait PoolAllocator: Sized {
  /// Element type handed out by [`allocate`](Self::allocate).
  type Value;

  /// The same allocator family configured for elements of type `U`.
  type Rebind<U>: PoolAllocator<Value = U>;

  /// Allocates uninitialised storage for `count` values.
  fn allocate(
    &mut self,
    count: usize,
  ) -> Result<NonNull<Self::Value>, AllocError>;

  /// Returns storage to the allocator. A null `ptr` is ignored.
  ///
  /// # Safety
  ///
  /// `ptr` must come from `allocate` on this allocator, must not have been
  /// freed already, and `count` must not exceed the count it was allocated
  /// with.
  unsafe fn deallocate(
    &mut self,
    ptr: *mut Self::Value,
    count: usize,
  );

  /// Builds an allocator for `U` with the same configuration.
  fn rebind<U>(&self) -> Result<Self::Rebind<U>, AllocError>;
}

impl<T> PoolAllocator for FreeListAllocator<T> {
  type Value = T;
  type Rebind<U> = FreeListAllocator<U>;

  fn allocate(
    &mut self,
    count: usize,
  ) -> Result<NonNull<T>, AllocError> {
    FreeListAllocator::allocate(self, count)
  }

  unsafe fn deallocate(
    &mut self,
    ptr: *mut T,
    count: usize,
  ) {
    unsafe { FreeListAllocator::deallocate(self, ptr, count) }
  }

  /// The rebound pool has the same block count over a fresh arena of its
  /// own; nothing is shared with `self`.
  fn rebind<U>(&self) -> Result<FreeListAllocator<U>, AllocError> {
    FreeListAllocator::with_config(self.config.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn fill<A: PoolAllocator<Value = u32>>(pool: &mut A) -> NonNull<u32> {
    let ptr = pool.allocate(4).unwrap();
    for i in 0..4 {
      unsafe { ptr.as_ptr().add(i).write(i as u32 * 10) };
    }
    ptr
  }

  #[test]
  fn test_trait_allocate_and_deallocate() {
    let mut pool = FreeListAllocator::<u32>::new(16).unwrap();

    let ptr = fill(&mut pool);
    unsafe {
      assert_eq!(*ptr.as_ptr().add(3), 30);
      PoolAllocator::deallocate(&mut pool, ptr.as_ptr(), 4);
    }

    assert_eq!(pool.blocks().count(), 1);
  }

  #[test]
  fn test_rebind_keeps_block_count() {
    let pool = FreeListAllocator::<u8>::new(12).unwrap();
    let rebound: FreeListAllocator<[u64; 4]> = pool.rebind().unwrap();

    assert_eq!(rebound.block_count(), 12);
    assert_eq!(rebound.capacity(), 12 * FreeListAllocator::<[u64; 4]>::STRIDE);
    assert_ne!(rebound.capacity(), pool.capacity());
  }

  #[test]
  fn test_rebound_pools_are_independent() {
    let mut pool = FreeListAllocator::<u16>::new(4).unwrap();
    let mut rebound = pool.rebind::<u16>().unwrap();

    let whole = (pool.capacity() - pool.header_size()) / 2;
    let _a = PoolAllocator::allocate(&mut pool, whole).unwrap();

    assert!(PoolAllocator::allocate(&mut pool, 1).is_err());
    assert!(PoolAllocator::allocate(&mut rebound, 1).is_ok());
  }
}
