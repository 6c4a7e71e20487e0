//! # freelist-pool - A Fixed-Capacity Free-List Allocator
//!
//! This crate provides a pool allocator that carves typed allocations out of a
//! single arena reserved up front with `mmap(2)`. Free space is tracked with an
//! **explicit free list**: a doubly linked list threaded through headers that
//! live inside the arena itself.
//!
//! ## Overview
//!
//! ```text
//!   Arena (capacity fixed at construction):
//!
//!   offset 0                                                         capacity
//!   ┌────────┬──────────┬────────┬──────┬────────┬────────────────────────┐
//!   │ header │ payload  │ header │ pay. │ header │        (free)          │
//!   │  A=1   │          │  B=0   │      │  C=0   │                        │
//!   └────────┴──────────┴────────┴──────┴────────┴────────────────────────┘
//!   ◄──────── A ────────►◄──── B ──────►◄──────────────── C ─────────────►
//!
//!   size | allocated    total bytes of the block, bit 0 = allocated
//!   left_size           size of the block physically to the left
//!   next / prev         free-list links (offsets), only while free
//! ```
//!
//! Blocks tile the arena: walking from offset 0 by `size` lands exactly on
//! `capacity`. Two kinds of neighbour are kept apart:
//!
//! - **physical** neighbours, found with `left_size` (left) or `offset + size`
//!   (right), are what coalescing merges;
//! - **free-list** neighbours, `next`/`prev`, are only an unordered index of
//!   free blocks.
//!
//! ## Crate Structure
//!
//! ```text
//!   freelist_pool
//!   ├── align      - align_to! macro and checked rounding
//!   ├── block      - In-band block header (internal)
//!   ├── config     - PoolConfig
//!   ├── error      - AllocError, HeapCorruption
//!   ├── free_list  - FreeListAllocator: allocation and coalescing
//!   ├── inspect    - Block walks, stats, invariant validation
//!   ├── rebind     - PoolAllocator trait for container code
//!   └── storage    - mmap-backed arena (internal)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use freelist_pool::FreeListAllocator;
//!
//! let mut pool = FreeListAllocator::<u64>::new(64)?;
//!
//! let ptr = pool.allocate(4)?;
//! unsafe {
//!   for i in 0..4 {
//!     ptr.as_ptr().add(i).write(i as u64);
//!   }
//!   pool.deallocate(ptr.as_ptr(), 4);
//! }
//!
//! assert_eq!(pool.blocks().count(), 1);
//! # Ok::<(), freelist_pool::AllocError>(())
//! ```
//!
//! ## How It Works
//!
//! **Allocation** walks the free list from its head and takes the first block
//! that fits (first fit). If enough is left over to hold another header, the
//! front of the block is handed out and the tail stays in the free list in the
//! same position:
//!
//! ```text
//!   before:  [ free ........................................ ]
//!   after:   [ alloc (header + request) ][ free remainder .. ]
//! ```
//!
//! Otherwise the whole block is handed out.
//!
//! **Deallocation** clears the allocated flag, merges into a free left
//! neighbour, absorbs a free right neighbour (unlinking it from the free list
//! first), and pushes the result at the head of the free list unless it was
//! merged into an already linked left neighbour. No two free blocks are ever
//! adjacent afterwards.
//!
//! ## Limitations
//!
//! - **Fixed capacity**: the arena never grows or shrinks
//! - **No compaction**: fragmented free space cannot satisfy a request that
//!   no single block fits
//! - **Single-threaded only**: `Send` but not `Sync`; wrap it in a mutex to share
//! - **Raw storage**: no constructors or destructors are ever run
//! - **Unix-only**: requires `libc` and `mmap`
//!
//! ## Safety
//!
//! `deallocate` is `unsafe`: passing a pointer that did not come from the same
//! pool, or freeing twice, corrupts the heap. Debug builds assert on both.

pub mod align;
mod block;
pub mod config;
pub mod error;
mod free_list;
pub mod inspect;
mod rebind;
mod storage;

pub use config::PoolConfig;
pub use error::{AllocError, HeapCorruption};
pub use free_list::FreeListAllocator;
pub use inspect::{BlockInfo, PoolStats};
pub use rebind::PoolAllocator;
