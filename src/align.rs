/// Rounds `value` up to the next multiple of `align`.
///
/// `align` must be a power of two. The expansion is a plain expression, so the
/// macro can be used in `const` items.
///
/// # Examples
///
/// ```rust
/// use freelist_pool::align_to;
///
/// assert_eq!(align_to!(13, 16), 16);
/// assert_eq!(align_to!(32, 16), 32);
/// assert_eq!(align_to!(0, 8), 0);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $align:expr) => {
    ($value + $align - 1) & !($align - 1)
  };
}

/// Overflow-checked version of [`align_to!`] for sizes derived from caller
/// input.
pub const fn checked_align_to(
  value: usize,
  align: usize,
) -> Option<usize> {
  debug_assert!(align.is_power_of_two());

  match value.checked_add(align - 1) {
    Some(bumped) => Some(bumped & !(align - 1)),
    None => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_align_to() {
    for align in [1usize, 2, 8, 16, 64] {
      let mut alignments = Vec::new();

      for i in 0..10 {
        let sizes = (align * i + 1)..=(align * (i + 1));
        alignments.push((sizes, align * (i + 1)));
      }

      for (sizes, expected) in alignments {
        for size in sizes {
          assert_eq!(expected, align_to!(size, align));
        }
      }
    }
  }

  #[test]
  fn test_checked_align_to() {
    assert_eq!(checked_align_to(17, 16), Some(32));
    assert_eq!(checked_align_to(48, 16), Some(48));
    assert_eq!(checked_align_to(usize::MAX - 3, 16), None);
  }
}
