//! # heapcore - A Custom Memory Allocator Library
//!
//! This crate provides a **general-purpose heap allocator** implementation
//! in Rust that manages memory as a set of independently `mmap`-backed
//! regions, each carved into a doubly linked list of blocks.
//!
//! ## Overview
//!
//! Unlike a bump allocator, this heap reuses freed blocks: allocation
//! walks the block list under one of three placement policies, splitting
//! a candidate block when it is larger than needed; deallocation merges
//! a freed block back into its physically contiguous neighbours.
//!
//! ```text
//!   Heap Concept:
//!
//!   ┌──────────────────────────────────────────────────────────────────┐
//!   │  Region 1 (mmap)             Region 2 (mmap, elsewhere)          │
//!   │  ┌─────┬─────┬─────┐         ┌─────┬─────┐                       │
//!   │  │used │free │used │ ─ next→ │free │used │                       │
//!   │  └─────┴─────┴─────┘         └─────┴─────┘                       │
//!   │                                                                    │
//!   │  The block list threads across regions. Coalescing checks both    │
//!   │  list adjacency and physical contiguity before merging.           │
//!   └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   heapcore
//!   ├── align      - Alignment constant and macro
//!   ├── block      - Block header layout (internal)
//!   ├── policy     - Placement policy selection
//!   ├── guard      - Per-thread reentrancy guard
//!   ├── error      - Internal fallible error type
//!   ├── map        - OS mapping provider (mmap/munmap)
//!   ├── sink       - Byte-oriented, reentrancy-safe log emitter
//!   ├── config     - Construction-time configuration
//!   └── heap       - Heap engine: block list, placement, public API
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use heapcore::Heap;
//! use heapcore::config::AllocatorConfig;
//!
//! fn main() {
//!     let heap = Heap::with_os_provider(AllocatorConfig::default());
//!
//!     unsafe {
//!         let ptr = heap.allocate(64) as *mut u64;
//!         *ptr = 42;
//!         println!("Value: {}", *ptr);
//!         heap.free(ptr as *mut u8);
//!     }
//! }
//! ```
//!
//! Most callers don't need to construct a [`Heap`] at all: the crate also
//! exposes free functions ([`allocate`], [`free`], [`zeroed`],
//! [`reallocate`], and the introspection/control surface) backed by a
//! single process-wide instance, initialized explicitly on first use from
//! [`AllocatorConfig::from_env`].
//!
//! ## Concurrency
//!
//! All mutating operations on a [`Heap`] serialize through one mutex; the
//! heap is safe to share across threads but not lock-free. A per-thread
//! guard prevents a reentrant call (e.g. from code the log sink's file
//! open transitively invokes) from deadlocking on that same mutex —
//! reentrant calls take the configured fallback allocator instead.
//!
//! ## Safety
//!
//! This crate is inherently unsafe as it deals with raw memory management.
//! The `unsafe` surface is confined to the block list's structural
//! operators in [`heap`]; the public allocation API is safe to call.

pub mod align;
mod block;
pub mod config;
pub mod error;
pub mod guard;
mod heap;
pub mod map;
mod policy;
mod sink;

pub use config::AllocatorConfig;
pub use error::AllocatorError;
pub use heap::{Heap, HeapViolation, UsageStats};
pub use map::{MapProvider, OsMapProvider};
pub use policy::AllocationPolicy;

use std::path::Path;

/// Allocates `size` bytes from the process-wide heap. Returns null for a
/// zero-sized request, an overflowing computation, or a failed OS
/// mapping.
pub fn allocate(size: usize) -> *mut u8 {
  heap::global().allocate(size)
}

/// Frees a pointer previously returned by [`allocate`], [`zeroed`], or
/// [`reallocate`]. A no-op for null or for a pointer that is not a live
/// allocation from this heap.
pub fn free(p: *mut u8) {
  heap::global().free(p)
}

/// Allocates `count * size` bytes, zeroed. Returns null on overflow, a
/// zero total, or allocation failure.
pub fn zeroed(count: usize, size: usize) -> *mut u8 {
  heap::global().zeroed(count, size)
}

/// Resizes a previously allocated block, preserving its contents up to
/// the smaller of the old and new sizes.
pub fn reallocate(p: *mut u8, size: usize) -> *mut u8 {
  heap::global().reallocate(p, size)
}

/// Sets the active placement policy by its external code (`0` =
/// first-fit, `1` = best-fit, `2` = worst-fit); any other code is
/// ignored.
pub fn set_allocation_policy(code: u32) {
  heap::global().set_allocation_policy(code)
}

/// Returns every structural inconsistency currently detectable in the
/// process-wide heap's block list.
pub fn check_heap_consistency() -> Vec<HeapViolation> {
  heap::global().check_heap_consistency()
}

/// Snapshots allocated/free totals and block counts for the process-wide
/// heap.
pub fn memory_usage_stats() -> UsageStats {
  heap::global().memory_usage_stats()
}

/// Computes `1 - largest_free_block / total_free`, `0.0` when nothing is
/// free.
pub fn fragmentation_rate() -> f64 {
  heap::global().fragmentation_rate()
}

/// Binds the process-wide heap's log sink to `path`, or disables it for
/// `None`.
pub fn init_memory_log(path: Option<&Path>) -> Result<(), AllocatorError> {
  heap::global().init_memory_log(path)
}

/// Disables the process-wide heap's log sink.
pub fn close_memory_log() {
  heap::global().close_memory_log()
}

/// Testing-only: abandons the process-wide heap's entire block list.
pub fn reset_heap_for_testing() {
  heap::global().reset_heap_for_testing()
}
