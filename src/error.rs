//! Internal error type for the crate's fallible plumbing.
//!
//! None of these ever cross the public C-ABI-shaped surface
//! (`allocate`/`free`/`zeroed`/`reallocate`), which always collapses to a
//! null pointer or a silent no-op, matching what a real `malloc`
//! replacement must do. `AllocatorError` is only observed by callers
//! going through [`crate::Heap`]'s `try_*` methods directly, e.g. the
//! integration tests and the demo binary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AllocatorError {
  #[error("out of memory: OS mapping request failed")]
  OutOfMemory,
  #[error("invalid argument: {0}")]
  InvalidArgument(&'static str),
  #[error("pointer {0:#x} is not a live allocation")]
  InvalidPointer(usize),
  #[error("size computation overflowed")]
  Overflow,
  #[error("log sink I/O error: {0}")]
  LogIo(#[from] std::io::Error),
}
