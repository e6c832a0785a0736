//! The byte-oriented log sink and its bounded-buffer event emitter.
//!
//! Formats into a fixed-size stack buffer (never a heap-allocated
//! `String`) and writes the bytes straight to the bound file, so the
//! emitter itself never becomes a source of reentrant allocation no
//! matter what the structural operators are in the middle of doing.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Upper bound on a single formatted record, including the trailing
/// newline. Fixed at a conservative ≤ 256 bytes per record.
const RECORD_CAPACITY: usize = 256;

/// A byte-oriented write handle the emitter formats records into.
///
/// Holds no heap-allocated buffers of its own, so it is safe to call
/// before binding and after [`LogSink::unbind`].
pub struct LogSink {
  file: Mutex<Option<File>>,
}

impl LogSink {
  pub const fn new() -> Self {
    Self { file: Mutex::new(None) }
  }

  /// Opens `path` for write-truncate, replacing any previously bound
  /// sink. Binding is idempotent: a second bind closes the first file
  /// before opening the new one.
  pub fn bind(&self, path: &Path) -> std::io::Result<()> {
    let file = OpenOptions::new().write(true).create(true).truncate(true).open(path)?;
    *self.file.lock().unwrap() = Some(file);
    Ok(())
  }

  /// Releases the bound file, if any. Safe to call when nothing is bound.
  pub fn unbind(&self) {
    *self.file.lock().unwrap() = None;
  }

  /// Formats `args` into a bounded stack buffer, appends a newline, and
  /// writes it to the bound file. Silently dropped if no sink is bound;
  /// silently truncated (never panics, never grows the buffer) if the
  /// formatted record would overflow `RECORD_CAPACITY`.
  pub fn emit(&self, args: fmt::Arguments<'_>) {
    let mut guard = self.file.lock().unwrap();
    let Some(file) = guard.as_mut() else { return };

    let mut buf = [0u8; RECORD_CAPACITY];
    let mut cursor = StackCursor { buf: &mut buf, pos: 0 };
    let _ = fmt::write(&mut cursor, args);
    let len = cursor.pos;

    buf[len] = b'\n';
    let _ = file.write_all(&buf[..=len]);
  }
}

/// A `fmt::Write` sink over a fixed-size stack buffer that truncates
/// instead of growing, always leaving one byte of headroom for the
/// caller's trailing newline.
struct StackCursor<'a> {
  buf: &'a mut [u8],
  pos: usize,
}

impl fmt::Write for StackCursor<'_> {
  fn write_str(&mut self, s: &str) -> fmt::Result {
    let bytes = s.as_bytes();
    let headroom = self.buf.len().saturating_sub(self.pos).saturating_sub(1);
    let take = bytes.len().min(headroom);
    self.buf[self.pos..self.pos + take].copy_from_slice(&bytes[..take]);
    self.pos += take;
    Ok(())
  }
}
