use std::{marker::PhantomData, mem, ptr::NonNull};

use tracing::{debug, trace, warn};

use crate::{
  align::checked_align_to,
  align_to,
  block::{BlockHeader, NIL},
  config::PoolConfig,
  error::AllocError,
  storage::{MAX_ALIGN, Storage},
};

/// Minimum block granule. Keeps every block size even so bit 0 of the size
/// field is free for the allocated flag.
const MIN_ALIGN: usize = 16;

/// A fixed-capacity pool allocator for `T` with an explicit free list.
///
/// The arena is reserved once at construction and is never resized. Every
/// block, free or allocated, starts with an in-band header and blocks tile
/// the arena without gaps. Free blocks are threaded into a doubly linked list
/// (LIFO insertion). Allocation is first-fit over that list and splits off the
/// front of the chosen block. Deallocation merges with both physical neighbours.
///
/// The pool hands out raw, uninitialised storage and never runs destructors.
pub struct FreeListAllocator<T> {
  pub(crate) storage: Storage,
  pub(crate) config: PoolConfig,
  /// Offset of the first free block, or [`NIL`].
  pub(crate) head: usize,
  _marker: PhantomData<fn() -> T>,
}

impl<T> FreeListAllocator<T> {
  /// Alignment of every block offset and block size.
  pub const GRANULE: usize = if mem::align_of::<T>() > MIN_ALIGN {
    mem::align_of::<T>()
  } else {
    MIN_ALIGN
  };

  /// Distance from the start of a block to its payload.
  pub const HEADER_SIZE: usize = align_to!(mem::size_of::<BlockHeader>(), Self::GRANULE);

  /// Arena bytes contributed by each configured block: one header plus one
  /// element slot.
  pub const STRIDE: usize = Self::HEADER_SIZE + align_to!(mem::size_of::<T>(), Self::GRANULE);

  /// Reserves an arena large enough for `block_count` single-element blocks.
  pub fn new(block_count: usize) -> Result<Self, AllocError> {
    Self::with_config(PoolConfig::new(block_count))
  }

  pub fn with_config(config: PoolConfig) -> Result<Self, AllocError> {
    config.validate()?;

    if Self::GRANULE > MAX_ALIGN {
      return Err(AllocError::InvalidConfig {
        reason: "element alignment exceeds page alignment",
      });
    }

    let capacity = config
      .block_count
      .checked_mul(Self::STRIDE)
      .ok_or(AllocError::CapacityOverflow)?;

    let storage = Storage::reserve(capacity)?;

    let mut pool = Self {
      storage,
      config,
      head: NIL,
      _marker: PhantomData,
    };

    unsafe {
      pool.header(0).write(BlockHeader::new(capacity, 0));
      pool.push_front(0);
    }

    debug!(
      block_count = pool.config.block_count,
      capacity,
      header_size = Self::HEADER_SIZE,
      "free-list pool created"
    );

    Ok(pool)
  }

  /// Total arena bytes, headers included.
  pub fn capacity(&self) -> usize {
    self.storage.len()
  }

  pub fn block_count(&self) -> usize {
    self.config.block_count
  }

  pub fn config(&self) -> &PoolConfig {
    &self.config
  }

  pub fn header_size(&self) -> usize {
    Self::HEADER_SIZE
  }

  /// Allocates uninitialised storage for `count` values of `T`.
  ///
  /// Picks the first free-list block that fits. If the block has room for
  /// another header after the request, the tail is split off as a new free
  /// block; otherwise the whole block is handed out and the surplus is
  /// overallocation.
  ///
  /// On error the pool is unchanged.
  pub fn allocate(
    &mut self,
    count: usize,
  ) -> Result<NonNull<T>, AllocError> {
    if count == 0 {
      return Err(AllocError::ZeroCount);
    }

    let needed = Self::block_size_for(count)?;

    let Some(offset) = self.find_free_block(needed) else {
      let largest_free = self.largest_free_block();
      warn!(count, needed, largest_free, "allocation failed");
      return Err(AllocError::OutOfMemory {
        requested: needed,
        largest_free,
      });
    };

    unsafe {
      let block = self.header(offset);

      if (*block).size() - needed >= Self::HEADER_SIZE {
        self.split(offset, needed);
      } else {
        self.unlink(offset);
      }

      (*block).set_allocated(true);

      debug!(offset, count, size = (*block).size(), "allocated block");

      Ok(self.payload(offset))
    }
  }

  /// Returns a block obtained from [`allocate`](Self::allocate) to the pool.
  ///
  /// A null `ptr` is ignored. The freed block is merged with a free left
  /// neighbour, then with a free right neighbour, and only pushed onto the
  /// free list if it did not merge into an already linked left neighbour.
  ///
  /// # Safety
  ///
  /// `ptr` must have been returned by `allocate` on this pool and not freed
  /// since, and `count` must not exceed the count it was allocated with.
  /// Anything else is a contract violation: debug builds assert, release
  /// builds corrupt the heap.
  pub unsafe fn deallocate(
    &mut self,
    ptr: *mut T,
    count: usize,
  ) {
    if ptr.is_null() {
      return;
    }

    let offset = self.block_offset(ptr);

    unsafe {
      let block = self.header(offset);

      debug_assert!((*block).is_allocated(), "double free of block at offset {offset}");
      debug_assert!(
        count.saturating_mul(mem::size_of::<T>()) <= (*block).size() - Self::HEADER_SIZE,
        "deallocating {count} elements from a smaller block at offset {offset}"
      );

      (*block).set_allocated(false);
      debug!(offset, count, size = (*block).size(), "freeing block");

      let mut current = offset;
      let mut linked = false;

      if current != 0 {
        let left = current - (*block).left_size;
        let left_block = self.header(left);

        if !(*left_block).is_allocated() {
          (*left_block).grow((*block).size());
          debug!(left, absorbed = offset, size = (*left_block).size(), "merged into left neighbour");
          current = left;
          linked = true;
        }
      }

      let current_block = self.header(current);
      let right = current + (*current_block).size();

      if right < self.capacity() {
        let right_block = self.header(right);

        if !(*right_block).is_allocated() {
          self.unlink(right);
          (*current_block).grow((*right_block).size());
          debug!(current, absorbed = right, size = (*current_block).size(), "merged right neighbour");
        }
      }

      let following = current + (*current_block).size();
      if following < self.capacity() {
        (*self.header(following)).left_size = (*current_block).size();
      }

      if !linked {
        self.push_front(current);
      }
    }
  }

  /// Block bytes (header included) needed for `count` elements.
  fn block_size_for(count: usize) -> Result<usize, AllocError> {
    count
      .checked_mul(mem::size_of::<T>())
      .and_then(|bytes| checked_align_to(bytes, Self::GRANULE))
      .and_then(|payload| payload.checked_add(Self::HEADER_SIZE))
      .ok_or(AllocError::CapacityOverflow)
  }

  /// First-fit walk of the free list.
  fn find_free_block(
    &self,
    needed: usize,
  ) -> Option<usize> {
    let mut current = self.head;

    while current != NIL {
      let block = unsafe { &*self.header(current) };
      trace!(offset = current, size = block.size(), needed, "checking free block");

      if block.size() >= needed {
        return Some(current);
      }
      current = block.next;
    }

    None
  }

  fn largest_free_block(&self) -> usize {
    self.free_list().map(|block| block.size).max().unwrap_or(0)
  }

  /// Carves the front `needed` bytes of the free block at `offset`. The tail
  /// becomes a free block that takes the original's place in the free list.
  unsafe fn split(
    &mut self,
    offset: usize,
    needed: usize,
  ) {
    unsafe {
      let block = self.header(offset);
      let total = (*block).size();
      let rest = offset + needed;
      let rest_size = total - needed;

      self.header(rest).write(BlockHeader::new(rest_size, needed));
      self.replace(offset, rest);
      (*block).set_size(needed);

      let following = rest + rest_size;
      if following < self.capacity() {
        (*self.header(following)).left_size = rest_size;
      }

      trace!(offset, needed, rest, rest_size, "split free block");
    }
  }

  unsafe fn push_front(
    &mut self,
    offset: usize,
  ) {
    unsafe {
      let block = self.header(offset);
      (*block).prev = NIL;
      (*block).next = self.head;

      if self.head != NIL {
        (*self.header(self.head)).prev = offset;
      }
      self.head = offset;
    }
  }

  unsafe fn unlink(
    &mut self,
    offset: usize,
  ) {
    unsafe {
      let block = self.header(offset);
      let (prev, next) = ((*block).prev, (*block).next);

      if prev == NIL {
        self.head = next;
      } else {
        (*self.header(prev)).next = next;
      }

      if next != NIL {
        (*self.header(next)).prev = prev;
      }

      (*block).clear_links();
    }
  }

  /// Puts the block at `new` into the free-list slot held by `old`.
  unsafe fn replace(
    &mut self,
    old: usize,
    new: usize,
  ) {
    unsafe {
      let old_block = self.header(old);
      let new_block = self.header(new);
      let (prev, next) = ((*old_block).prev, (*old_block).next);

      (*new_block).prev = prev;
      (*new_block).next = next;

      if prev == NIL {
        self.head = new;
      } else {
        (*self.header(prev)).next = new;
      }

      if next != NIL {
        (*self.header(next)).prev = new;
      }

      (*old_block).clear_links();
    }
  }

  /// Header of the block starting at `offset`.
  pub(crate) fn header(
    &self,
    offset: usize,
  ) -> *mut BlockHeader {
    debug_assert!(offset < self.capacity(), "block offset {offset} outside arena");
    debug_assert_eq!(offset % Self::GRANULE, 0, "misaligned block offset {offset}");

    unsafe { self.storage.base().as_ptr().add(offset).cast::<BlockHeader>() }
  }

  unsafe fn payload(
    &self,
    offset: usize,
  ) -> NonNull<T> {
    unsafe { self.storage.base().add(offset + Self::HEADER_SIZE).cast() }
  }

  /// Recovers the block offset from a payload pointer.
  fn block_offset(
    &self,
    ptr: *mut T,
  ) -> usize {
    let base = self.storage.base().as_ptr() as usize;
    let addr = ptr as usize;

    // A header-only block for a zero-sized `T` has its payload at the arena end.
    debug_assert!(
      addr >= base + Self::HEADER_SIZE && addr <= base + self.capacity(),
      "pointer {ptr:?} was not allocated from this pool"
    );

    let offset = addr - base - Self::HEADER_SIZE;
    debug_assert_eq!(offset % Self::GRANULE, 0, "pointer {ptr:?} is not a block payload");

    offset
  }
}

impl<T> Drop for FreeListAllocator<T> {
  fn drop(&mut self) {
    let live = self.blocks().filter(|block| block.allocated).count();

    debug!(capacity = self.capacity(), live, "releasing free-list pool");
  }
}
