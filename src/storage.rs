use std::{io, ptr, ptr::NonNull};

use tracing::{debug, error};

use crate::error::AllocError;

/// Largest block granule the arena can honour. `mmap` only guarantees page
/// alignment for the base address.
pub(crate) const MAX_ALIGN: usize = 4096;

/// The arena: one anonymous private mapping, reserved once and unmapped on
/// drop.
pub(crate) struct Storage {
  base: NonNull<u8>,
  len: usize,
}

// The mapping is owned exclusively by this value and never aliased by another
// pool.
unsafe impl Send for Storage {}

impl Storage {
  /// Maps `len` bytes of zeroed, readable and writable memory.
  pub fn reserve(len: usize) -> Result<Self, AllocError> {
    let addr = unsafe {
      libc::mmap(
        ptr::null_mut(),
        len,
        libc::PROT_READ | libc::PROT_WRITE,
        libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
        -1,
        0,
      )
    };

    if addr == libc::MAP_FAILED {
      let errno = io::Error::last_os_error().raw_os_error().unwrap_or(0);
      error!(capacity = len, errno, "arena reservation failed");
      return Err(AllocError::ReserveFailed { capacity: len, errno });
    }

    let base = NonNull::new(addr.cast::<u8>()).ok_or(AllocError::ReserveFailed {
      capacity: len,
      errno: 0,
    })?;

    debug!(base = ?base, len, "arena reserved");

    Ok(Self { base, len })
  }

  pub fn base(&self) -> NonNull<u8> {
    self.base
  }

  pub fn len(&self) -> usize {
    self.len
  }
}

impl Drop for Storage {
  fn drop(&mut self) {
    let rc = unsafe { libc::munmap(self.base.as_ptr().cast(), self.len) };

    if rc != 0 {
      error!(base = ?self.base, len = self.len, error = %io::Error::last_os_error(), "munmap failed");
    }
  }
}
