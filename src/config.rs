//! Pool configuration.

use crate::error::AllocError;

/// Configuration for a [`FreeListAllocator`](crate::FreeListAllocator).
///
/// The block count is the only setting: it fixes the arena capacity at
/// `block_count * stride` bytes, where the stride is one header plus one
/// element slot. The capacity never changes after construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
  /// Number of single-element blocks the arena can hold when fully split.
  pub block_count: usize,
}

impl PoolConfig {
  pub fn new(block_count: usize) -> Self {
    Self { block_count }
  }

  /// Rejects configurations that cannot produce a usable arena.
  pub fn validate(&self) -> Result<(), AllocError> {
    if self.block_count == 0 {
      return Err(AllocError::InvalidConfig {
        reason: "block count must be at least 1",
      });
    }

    Ok(())
  }
}
