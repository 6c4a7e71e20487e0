//! Read-only views of the arena: block walks, free-list walks, usage figures
//! and a full invariant check.

use crate::{
  block::NIL,
  error::HeapCorruption,
  free_list::FreeListAllocator,
};

/// Snapshot of one block's header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
  /// Byte offset of the header from the start of the arena.
  pub offset: usize,
  /// Total block size, header included.
  pub size: usize,
  /// Size of the physically preceding block, 0 for the first block.
  pub left_size: usize,
  pub allocated: bool,
}

/// Aggregate usage figures. Byte counts include headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
  pub capacity: usize,
  pub free_bytes: usize,
  pub used_bytes: usize,
  pub free_blocks: usize,
  pub allocated_blocks: usize,
  /// Largest single free block; an allocation needing more fails even when
  /// `free_bytes` would cover it.
  pub largest_free: usize,
}

/// Blocks in address order. Produced by [`FreeListAllocator::blocks`].
pub struct Blocks<'a, T> {
  pool: &'a FreeListAllocator<T>,
  offset: usize,
}

impl<T> Iterator for Blocks<'_, T> {
  type Item = BlockInfo;

  fn next(&mut self) -> Option<BlockInfo> {
    if self.offset >= self.pool.capacity() {
      return None;
    }

    let info = self.pool.block_info(self.offset);
    // A zero size would never advance; stop rather than spin on a corrupt heap.
    self.offset = if info.size == 0 { self.pool.capacity() } else { self.offset + info.size };

    Some(info)
  }
}

/// Free blocks in list order. Produced by [`FreeListAllocator::free_list`].
pub struct FreeList<'a, T> {
  pool: &'a FreeListAllocator<T>,
  current: usize,
  /// Upper bound on list length; guards against link cycles.
  budget: usize,
}

impl<T> Iterator for FreeList<'_, T> {
  type Item = BlockInfo;

  fn next(&mut self) -> Option<BlockInfo> {
    if self.current == NIL || self.current >= self.pool.capacity() || self.budget == 0 {
      return None;
    }

    self.budget -= 1;
    let info = self.pool.block_info(self.current);
    self.current = unsafe { (*self.pool.header(self.current)).next };

    Some(info)
  }
}

impl<T> FreeListAllocator<T> {
  /// Walks every block from the start of the arena.
  pub fn blocks(&self) -> Blocks<'_, T> {
    Blocks { pool: self, offset: 0 }
  }

  /// Walks the free list from its head.
  pub fn free_list(&self) -> FreeList<'_, T> {
    FreeList {
      pool: self,
      current: self.head,
      budget: self.capacity() / Self::HEADER_SIZE,
    }
  }

  pub fn stats(&self) -> PoolStats {
    self.blocks().fold(
      PoolStats {
        capacity: self.capacity(),
        ..PoolStats::default()
      },
      |mut stats, block| {
        if block.allocated {
          stats.used_bytes += block.size;
          stats.allocated_blocks += 1;
        } else {
          stats.free_bytes += block.size;
          stats.free_blocks += 1;
          stats.largest_free = stats.largest_free.max(block.size);
        }
        stats
      },
    )
  }

  /// Checks every structural invariant of the heap:
  ///
  /// - blocks tile the arena exactly
  /// - each `left_size` matches the physical predecessor
  /// - no two adjacent blocks are free
  /// - the free list links each free block exactly once, with consistent
  ///   back links, and nothing else
  ///
  /// Reports the first violation found; nothing is repaired.
  pub fn validate(&self) -> Result<(), HeapCorruption> {
    let capacity = self.capacity();
    let mut free = Vec::new();
    let mut offset = 0;
    let mut expected_left = 0;
    let mut previous_free: Option<usize> = None;

    while offset < capacity {
      let block = self.block_info(offset);

      if block.size < Self::HEADER_SIZE || block.size % Self::GRANULE != 0 || block.size > capacity - offset {
        return Err(HeapCorruption::BadSize { offset, size: block.size });
      }

      if block.left_size != expected_left {
        return Err(HeapCorruption::LeftSize {
          offset,
          expected: expected_left,
          found: block.left_size,
        });
      }

      if block.allocated {
        previous_free = None;
      } else {
        if let Some(left) = previous_free {
          return Err(HeapCorruption::AdjacentFree { left, right: offset });
        }
        previous_free = Some(offset);
        free.push(offset);
      }

      expected_left = block.size;
      offset += block.size;
    }

    if offset != capacity {
      return Err(HeapCorruption::Tiling { end: offset, capacity });
    }

    let mut linked = 0;
    let mut prev = NIL;
    let mut current = self.head;

    while current != NIL {
      // `free` is sorted by construction.
      if linked == free.len() || free.binary_search(&current).is_err() {
        return Err(HeapCorruption::StrayLink { offset: current });
      }

      let header = unsafe { &*self.header(current) };
      if header.prev != prev {
        return Err(HeapCorruption::BrokenBackLink {
          offset: current,
          expected: prev,
          found: header.prev,
        });
      }

      linked += 1;
      prev = current;
      current = header.next;
    }

    if linked != free.len() {
      return Err(HeapCorruption::FreeCount { linked, free: free.len() });
    }

    Ok(())
  }

  fn block_info(
    &self,
    offset: usize,
  ) -> BlockInfo {
    let header = unsafe { &*self.header(offset) };

    BlockInfo {
      offset,
      size: header.size(),
      left_size: header.left_size,
      allocated: header.is_allocated(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  type Slot = [u64; 2];

  const H: usize = FreeListAllocator::<Slot>::HEADER_SIZE;

  #[test]
  fn test_stats_track_usage() {
    let mut pool = FreeListAllocator::<Slot>::new(8).unwrap();
    let capacity = pool.capacity();

    let a = pool.allocate(2).unwrap();
    let _b = pool.allocate(1).unwrap();
    unsafe { pool.deallocate(a.as_ptr(), 2) };

    assert_eq!(
      pool.stats(),
      PoolStats {
        capacity,
        free_bytes: capacity - (H + 16),
        used_bytes: H + 16,
        free_blocks: 2,
        allocated_blocks: 1,
        largest_free: capacity - (H + 32) - (H + 16),
      }
    );
  }

  #[test]
  fn test_left_sizes_follow_predecessors() {
    let mut pool = FreeListAllocator::<Slot>::new(16).unwrap();

    let ptrs: Vec<_> = [3, 1, 4, 1, 5].iter().map(|&n| (pool.allocate(n).unwrap(), n)).collect();
    unsafe {
      pool.deallocate(ptrs[1].0.as_ptr(), ptrs[1].1);
      pool.deallocate(ptrs[3].0.as_ptr(), ptrs[3].1);
    }

    let blocks: Vec<_> = pool.blocks().collect();
    assert_eq!(blocks[0].left_size, 0);
    for pair in blocks.windows(2) {
      assert_eq!(pair[1].left_size, pair[0].size);
      assert_eq!(pair[1].offset, pair[0].offset + pair[0].size);
    }
  }

  #[test]
  fn test_validate_detects_left_size_corruption() {
    let mut pool = FreeListAllocator::<Slot>::new(8).unwrap();
    let _a = pool.allocate(1).unwrap();

    unsafe { (*pool.header(H + 16)).left_size = 0 };

    assert_eq!(
      pool.validate(),
      Err(HeapCorruption::LeftSize {
        offset: H + 16,
        expected: H + 16,
        found: 0,
      })
    );
  }

  #[test]
  fn test_validate_detects_unlinked_free_block() {
    let mut pool = FreeListAllocator::<Slot>::new(8).unwrap();
    let _a = pool.allocate(1).unwrap();

    pool.head = NIL;

    assert_eq!(pool.validate(), Err(HeapCorruption::FreeCount { linked: 0, free: 1 }));
  }

  #[test]
  fn test_validate_detects_adjacent_free_blocks() {
    let mut pool = FreeListAllocator::<Slot>::new(8).unwrap();
    let a = pool.allocate(1).unwrap();

    // Clear the flag behind the allocator's back: no merge happens.
    unsafe { (*pool.header(0)).set_allocated(false) };
    let _ = a;

    assert_eq!(pool.validate(), Err(HeapCorruption::AdjacentFree { left: 0, right: H + 16 }));
  }

  #[test]
  fn test_free_list_walk_stops_on_cycle() {
    let mut pool = FreeListAllocator::<Slot>::new(8).unwrap();
    let _a = pool.allocate(1).unwrap();
    let rest = pool.head;

    unsafe { (*pool.header(rest)).next = rest };

    assert!(pool.free_list().count() <= pool.capacity() / H);
    assert_eq!(pool.validate(), Err(HeapCorruption::StrayLink { offset: rest }));
  }
}
