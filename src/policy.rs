//! Placement policy selecting among free candidates during allocation.

/// Which free block the placement engine should pick for a given request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllocationPolicy {
  /// Return the first free block big enough, scanning from `heap_base`.
  #[default]
  FirstFit,
  /// Return the free block whose size is closest to (but not below) the
  /// request, short-circuiting on an exact match.
  BestFit,
  /// Return the largest free block available.
  WorstFit,
}

impl AllocationPolicy {
  /// Maps the external C-ABI-shaped policy codes (`FIRST_FIT=0`,
  /// `BEST_FIT=1`, `WORST_FIT=2`) to a policy. Any other code maps to
  /// `None`; callers ignore unrecognized codes and leave the active
  /// policy unchanged.
  pub fn from_code(code: u32) -> Option<Self> {
    match code {
      0 => Some(Self::FirstFit),
      1 => Some(Self::BestFit),
      2 => Some(Self::WorstFit),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unknown_codes_are_rejected() {
    assert_eq!(AllocationPolicy::from_code(3), None);
    assert_eq!(AllocationPolicy::from_code(u32::MAX), None);
  }

  #[test]
  fn known_codes_round_trip() {
    assert_eq!(AllocationPolicy::from_code(0), Some(AllocationPolicy::FirstFit));
    assert_eq!(AllocationPolicy::from_code(1), Some(AllocationPolicy::BestFit));
    assert_eq!(AllocationPolicy::from_code(2), Some(AllocationPolicy::WorstFit));
  }

  #[test]
  fn default_is_first_fit() {
    assert_eq!(AllocationPolicy::default(), AllocationPolicy::FirstFit);
  }
}
