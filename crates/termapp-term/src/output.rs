// SPDX-License-Identifier: MIT
//
// Output buffering.
//
// The renderer never writes to the terminal directly. Every cursor move,
// SGR sequence, and glyph goes into an OutputBuffer first, and the whole
// frame leaves in a single `write()` call at flush time. This keeps the
// syscall count at one per frame and hands the terminal's parser a
// complete frame instead of a trickle of fragments.
//
// Short writes: a tty may accept fewer bytes than offered. Whatever it
// didn't take stays at the front of the buffer and goes out first on the
// next flush. Nothing is dropped, and nothing is retried behind the
// caller's back.

use std::io::{self, Write};

/// Initial capacity: 16 KB, enough for most frames without reallocation.
const DEFAULT_CAPACITY: usize = 16_384;

/// A byte buffer that accumulates ANSI output for a single `write()` syscall.
pub struct OutputBuffer {
    buf: Vec<u8>,
}

impl OutputBuffer {
    /// Create an empty buffer with default capacity (16 KB).
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    /// Number of pending bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing is pending.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The pending bytes (for testing and debugging).
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append a character in its UTF-8 encoding.
    #[inline]
    pub fn push_char(&mut self, ch: char) {
        let mut enc = [0u8; 4];
        self.buf.extend_from_slice(ch.encode_utf8(&mut enc).as_bytes());
    }

    /// Discard all pending bytes (keeps allocated capacity).
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Offer all pending bytes to `w` in one `write` call.
    ///
    /// Returns the number of bytes the writer accepted. On a short write the
    /// remainder stays buffered for the next flush.
    ///
    /// # Errors
    ///
    /// Returns the writer's error unchanged; the buffer is left intact.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<usize> {
        if self.buf.is_empty() {
            return Ok(0);
        }

        let n = w.write(&self.buf)?;
        if n >= self.buf.len() {
            self.buf.clear();
            w.flush()?;
        } else {
            self.buf.drain(..n);
        }
        Ok(n)
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Intentionally a no-op. Real flushing goes through flush_to().
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
