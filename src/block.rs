/// Sentinel offset marking the end of the free list.
pub(crate) const NIL: usize = usize::MAX;

/// Low bit of [`BlockHeader::size`] used as the allocated flag.
const ALLOCATED: usize = 1;

/// In-band metadata placed at the start of every block in the arena.
///
/// ```text
///   ┌────────────────────┬───────────────────────────────┐
///   │ size | allocated   │ total block bytes, bit 0 flag │
///   │ left_size          │ size of physical predecessor  │
///   │ next               │ free-list successor offset    │
///   │ prev               │ free-list predecessor offset  │
///   └────────────────────┴───────────────────────────────┘
/// ```
///
/// `next` and `prev` are arena offsets, not addresses, and only mean something
/// while the block is free. `left_size` links *physical* neighbours and is
/// unrelated to free-list order.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockHeader {
  size: usize,
  pub left_size: usize,
  pub next: usize,
  pub prev: usize,
}

impl BlockHeader {
  /// Header for an unlinked free block.
  pub fn new(
    size: usize,
    left_size: usize,
  ) -> Self {
    debug_assert_eq!(size & ALLOCATED, 0, "block sizes are always even");

    Self {
      size,
      left_size,
      next: NIL,
      prev: NIL,
    }
  }

  /// True size of the block, header included.
  pub fn size(&self) -> usize {
    self.size & !ALLOCATED
  }

  pub fn is_allocated(&self) -> bool {
    self.size & ALLOCATED != 0
  }

  pub fn set_allocated(
    &mut self,
    allocated: bool,
  ) {
    if allocated {
      self.size |= ALLOCATED;
    } else {
      self.size &= !ALLOCATED;
    }
  }

  /// Replaces the size, keeping the allocated flag.
  pub fn set_size(
    &mut self,
    size: usize,
  ) {
    debug_assert_eq!(size & ALLOCATED, 0, "block sizes are always even");
    self.size = size | (self.size & ALLOCATED);
  }

  /// Absorbs `bytes` from a physically adjacent block.
  pub fn grow(
    &mut self,
    bytes: usize,
  ) {
    self.set_size(self.size() + bytes);
  }

  pub fn clear_links(&mut self) {
    self.next = NIL;
    self.prev = NIL;
  }
}
