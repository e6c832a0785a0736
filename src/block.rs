//! Block metadata header prepended to every live or free region.

use std::mem;
use std::ptr;

/// Metadata header for one block in the heap's doubly linked block list.
///
/// The user payload begins immediately after this header, at
/// `header_addr + HEADER_SIZE`. There is no flexible trailing array and
/// no redundant data pointer on the header (see the Open Questions in
/// the design notes) — the payload address is always derived from the
/// header address, never stored alongside it.
#[repr(C)]
pub struct Block {
  /// Size, in bytes, of the payload area. Always a multiple of `ALIGNMENT`.
  pub size: usize,
  /// Forward link in the global block list, or null.
  pub next: *mut Block,
  /// Backward link in the global block list, or null.
  pub prev: *mut Block,
  /// True iff the payload is not currently handed out to a user.
  pub is_free: bool,
}

impl Block {
  pub fn new(
    size: usize,
    is_free: bool,
    prev: *mut Block,
    next: *mut Block,
  ) -> Self {
    Self { size, next, prev, is_free }
  }
}

/// Size, in bytes, of a block header rounded up to `ALIGNMENT`.
///
/// Computed with `offsetof`-equivalent reasoning via `size_of`: since
/// `Block` carries no flexible array member, `size_of::<Block>()` already
/// excludes the payload, matching the C original's
/// `offsetof(struct s_block, data)`.
pub const HEADER_SIZE: usize = crate::align!(mem::size_of::<Block>());

/// Computes the block header address for a user payload pointer.
///
/// # Safety
///
/// The caller must ensure `p` is non-null; the returned pointer is not
/// dereferenced here, only computed.
#[inline]
pub unsafe fn block_from_ptr(p: *mut u8) -> *mut Block {
  unsafe { p.sub(HEADER_SIZE) as *mut Block }
}

/// Computes the user payload address for a block header pointer.
///
/// # Safety
///
/// The caller must ensure `block` is non-null.
#[inline]
pub unsafe fn ptr_from_block(block: *mut Block) -> *mut u8 {
  unsafe { (block as *mut u8).add(HEADER_SIZE) }
}

#[inline]
pub fn null_block() -> *mut Block {
  ptr::null_mut()
}
