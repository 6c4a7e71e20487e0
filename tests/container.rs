use std::{ptr::NonNull, rc::Rc};

use freelist_pool::{AllocError, FreeListAllocator, PoolAllocator};

/// Minimal fixed-capacity vector that only knows the `PoolAllocator` contract.
struct FixedVec<A: PoolAllocator> {
  alloc: A,
  ptr: NonNull<A::Value>,
  len: usize,
  cap: usize,
}

impl<A: PoolAllocator> FixedVec<A> {
  fn with_capacity_in(
    cap: usize,
    mut alloc: A,
  ) -> Result<Self, AllocError> {
    let ptr = alloc.allocate(cap)?;
    Ok(Self { alloc, ptr, len: 0, cap })
  }

  fn push(
    &mut self,
    value: A::Value,
  ) -> Result<(), A::Value> {
    if self.len == self.cap {
      return Err(value);
    }

    unsafe { self.ptr.as_ptr().add(self.len).write(value) };
    self.len += 1;
    Ok(())
  }

  fn as_slice(&self) -> &[A::Value] {
    unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
  }
}

impl<A: PoolAllocator> Drop for FixedVec<A> {
  fn drop(&mut self) {
    unsafe {
      std::ptr::drop_in_place(std::ptr::slice_from_raw_parts_mut(self.ptr.as_ptr(), self.len));
      self.alloc.deallocate(self.ptr.as_ptr(), self.cap);
    }
  }
}

/// Builds a container of strings from whatever allocator family the caller
/// uses, without naming the concrete allocator.
fn labels_like<A: PoolAllocator>(
  alloc: &A,
  labels: &[&str],
) -> Result<FixedVec<A::Rebind<String>>, AllocError> {
  let mut out = FixedVec::with_capacity_in(labels.len(), alloc.rebind::<String>()?)?;
  for label in labels {
    assert!(out.push(label.to_string()).is_ok());
  }
  Ok(out)
}

#[test]
fn vec_backed_by_pool() {
  let pool = FreeListAllocator::<u32>::new(16).unwrap();
  let mut values = FixedVec::with_capacity_in(8, pool).unwrap();

  for i in 0..8 {
    assert!(values.push(i * i).is_ok());
  }
  assert_eq!(values.push(99), Err(99));
  assert_eq!(values.as_slice(), &[0, 1, 4, 9, 16, 25, 36, 49]);
}

#[test]
fn vec_capacity_limited_by_pool() {
  let pool = FreeListAllocator::<u64>::new(4).unwrap();
  let too_many = pool.capacity();

  assert!(matches!(
    FixedVec::with_capacity_in(too_many, pool),
    Err(AllocError::OutOfMemory { .. })
  ));
}

#[test]
fn rebound_allocator_holds_owned_values() {
  let ints = FreeListAllocator::<u8>::new(8).unwrap();
  let labels = labels_like(&ints, &["alpha", "beta", "gamma"]).unwrap();

  assert_eq!(labels.as_slice(), &["alpha", "beta", "gamma"]);
  assert_eq!(labels.alloc.block_count(), ints.block_count());
}

#[test]
fn dropping_vec_runs_element_destructors() {
  let counter = Rc::new(());

  let pool = FreeListAllocator::<Rc<()>>::new(8).unwrap();
  let mut shared = FixedVec::with_capacity_in(3, pool).unwrap();
  for _ in 0..3 {
    assert!(shared.push(Rc::clone(&counter)).is_ok());
  }

  assert_eq!(Rc::strong_count(&counter), 4);
  assert_eq!(shared.alloc.stats().allocated_blocks, 1);

  drop(shared);
  assert_eq!(Rc::strong_count(&counter), 1);
}

#[test]
fn trait_round_trip_restores_single_block() {
  let mut pool = FreeListAllocator::<String>::new(8).unwrap();

  let ptr = PoolAllocator::allocate(&mut pool, 3).unwrap();
  unsafe { PoolAllocator::deallocate(&mut pool, ptr.as_ptr(), 3) };

  assert_eq!(pool.blocks().count(), 1);
  pool.validate().unwrap();
}
