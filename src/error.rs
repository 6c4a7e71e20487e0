//! Error types reported by the pool.

/// Failures surfaced by construction and allocation.
///
/// Every variant is returned before any block header or free-list link is
/// touched, so the pool is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
  /// Backing storage could not be reserved; no pool was created.
  #[error("failed to reserve {capacity} bytes of backing storage (errno {errno})")]
  ReserveFailed {
    /// Bytes requested from the OS.
    capacity: usize,
    /// `errno` reported by the reservation call.
    errno: i32,
  },

  /// No single free block is large enough. Aggregate free space may still
  /// exceed the request; the pool never compacts.
  #[error("out of memory: need a {requested}-byte block, largest free block is {largest_free} bytes")]
  OutOfMemory {
    /// Block bytes required, header included.
    requested: usize,
    /// Size of the largest free block at the time of the call.
    largest_free: usize,
  },

  /// `allocate(0)` was requested.
  #[error("allocation of zero elements requested")]
  ZeroCount,

  /// A size computation overflowed `usize`.
  #[error("requested size overflows the address space")]
  CapacityOverflow,

  /// The pool configuration was rejected.
  #[error("invalid pool configuration: {reason}")]
  InvalidConfig {
    /// What was wrong.
    reason: &'static str,
  },
}

/// An invariant violation found by
/// [`FreeListAllocator::validate`](crate::FreeListAllocator::validate).
///
/// Offsets are byte offsets from the start of the arena.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeapCorruption {
  #[error("block at offset {offset} has invalid size {size}")]
  BadSize { offset: usize, size: usize },

  #[error("blocks end at offset {end}, arena capacity is {capacity}")]
  Tiling { end: usize, capacity: usize },

  #[error("block at offset {offset} records left size {found}, predecessor is {expected} bytes")]
  LeftSize {
    offset: usize,
    expected: usize,
    found: usize,
  },

  #[error("free blocks at offsets {left} and {right} are adjacent")]
  AdjacentFree { left: usize, right: usize },

  #[error("free list links to offset {offset}, which is not a free block")]
  StrayLink { offset: usize },

  #[error("free list node at offset {offset} has prev {found}, expected {expected}")]
  BrokenBackLink {
    offset: usize,
    expected: usize,
    found: usize,
  },

  #[error("free list holds {linked} blocks, arena has {free} free blocks")]
  FreeCount { linked: usize, free: usize },
}
