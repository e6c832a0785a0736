//! Per-thread recursion guard.
//!
//! The allocator must coexist with code that itself calls into the
//! allocator while already inside an allocator call — the log sink's file
//! open, a fallback allocator resolved lazily, or startup code the host
//! process runs before the heap is otherwise touched. Each thread gets its
//! own flag so the guard cannot false-trip across threads that happen to
//! be serialized externally (see the crate's top-level documentation for
//! how `Heap` serializes access).

use std::cell::Cell;

thread_local! {
  static IN_ALLOCATOR: Cell<bool> = const { Cell::new(false) };
}

/// RAII scope held for the duration of a guarded allocator call. Dropping
/// it clears the thread-local flag on every exit path, including early
/// returns, `?`, and panics — not just the happy path.
pub struct GuardScope(());

impl Drop for GuardScope {
  fn drop(&mut self) {
    IN_ALLOCATOR.with(|flag| flag.set(false));
  }
}

/// Attempts to enter the recursion guard for the current thread.
///
/// Returns `None` if the guard is already held (the caller is re-entering
/// from code that was itself invoked by the allocator), in which case the
/// caller must take its fallback/no-op path rather than recurse.
/// Otherwise returns `Some(scope)`; the flag is cleared when `scope` is
/// dropped.
pub fn enter() -> Option<GuardScope> {
  IN_ALLOCATOR.with(|flag| {
    if flag.get() {
      None
    } else {
      flag.set(true);
      Some(GuardScope(()))
    }
  })
}

/// True if the current thread is already inside a guarded call.
pub fn is_held() -> bool {
  IN_ALLOCATOR.with(|flag| flag.get())
}
