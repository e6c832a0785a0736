//! Explicit configuration for a [`crate::Heap`] instance.

use crate::policy::AllocationPolicy;
use std::path::PathBuf;
use std::ptr;
use std::sync::Arc;

/// The re-entrant fallback allocator, invoked only when the recursion
/// guard is already held on the current thread. Injected rather than
/// hard-coded: a host that LD_PRELOAD-style replaces the system
/// allocator would wire in a `dlsym(RTLD_NEXT, "malloc")`-resolved
/// function here; this crate ships only the documented stub (returns
/// null) plus, in the demo binary, a wiring to `libc::malloc`.
pub type FallbackAllocator = Arc<dyn Fn(usize) -> *mut u8 + Send + Sync>;

/// Construction-time configuration for a [`crate::Heap`].
pub struct AllocatorConfig {
  /// The placement policy active from the first allocation.
  pub initial_policy: AllocationPolicy,
  /// If set, the log sink is bound to this path at construction time.
  pub log_path: Option<PathBuf>,
  /// Invoked by `allocate` whenever the recursion guard is already held.
  pub fallback: FallbackAllocator,
}

impl AllocatorConfig {
  /// Builds a configuration from `ALLOCATOR_POLICY` (`FIRST_FIT` /
  /// `BEST_FIT` / `WORST_FIT`, case-insensitive, or the numeric code) and
  /// `ALLOCATOR_LOG_PATH`. Unrecognized or absent values fall back to
  /// this crate's defaults.
  pub fn from_env() -> Self {
    let initial_policy = std::env::var("ALLOCATOR_POLICY")
      .ok()
      .and_then(|value| policy_from_str(&value))
      .unwrap_or_default();
    let log_path = std::env::var_os("ALLOCATOR_LOG_PATH").map(PathBuf::from);

    Self { initial_policy, log_path, fallback: stub_fallback() }
  }
}

impl Default for AllocatorConfig {
  fn default() -> Self {
    Self { initial_policy: AllocationPolicy::default(), log_path: None, fallback: stub_fallback() }
  }
}

fn policy_from_str(value: &str) -> Option<AllocationPolicy> {
  match value.trim().to_ascii_uppercase().as_str() {
    "FIRST_FIT" | "0" => Some(AllocationPolicy::FirstFit),
    "BEST_FIT" | "1" => Some(AllocationPolicy::BestFit),
    "WORST_FIT" | "2" => Some(AllocationPolicy::WorstFit),
    _ => None,
  }
}

fn stub_fallback() -> FallbackAllocator {
  Arc::new(|_size: usize| ptr::null_mut())
}
