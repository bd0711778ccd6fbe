// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No state,
// no decisions about when to emit; the diff renderer makes those. This
// module just knows the byte-level encoding of the one VT100/xterm dialect
// we target.
//
// All cursor positions are 0-indexed in our API and converted to 1-indexed
// for the terminal (ANSI standard uses 1-based coordinates).
//
// All functions return `io::Result` propagated from the underlying writer.
// In practice they never fail when writing to `OutputBuffer` (backed by a Vec).

use std::io::{self, Write};

use crate::cell::{Style, StyleDiff};

/// Home the cursor, erase the display, reset attributes, hide the cursor.
///
/// Sent once at session start so the renderer's blank model of the screen
/// matches reality.
pub const CLEAR: &[u8] = b"\x1b[H\x1b[2J\x1b[0m\x1b[?25l";

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Emit the full [`CLEAR`] sequence.
#[inline]
pub fn clear(w: &mut impl Write) -> io::Result<()> {
    w.write_all(CLEAR)
}

/// Reset all SGR attributes to terminal defaults (SGR 0).
///
/// The renderer must forget its last-sent style after this.
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m")
}

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to `(x, y)` using the CUP (Cursor Position) sequence.
///
/// Our coordinates are 0-indexed; ANSI CUP is 1-indexed.
#[inline]
pub fn cursor_to(w: &mut impl Write, x: u16, y: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", u32::from(y) + 1, u32::from(x) + 1)
}

/// Move the cursor `n` columns right (CUF). The count is omitted for 1.
///
/// `n = 0` writes nothing: CUF treats a zero count as one.
#[inline]
pub fn cursor_right(w: &mut impl Write, n: u16) -> io::Result<()> {
    match n {
        0 => Ok(()),
        1 => w.write_all(b"\x1b[C"),
        _ => write!(w, "\x1b[{n}C"),
    }
}

/// Hide the cursor (DECTCEM reset).
#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

/// Show the cursor (DECTCEM set).
#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

// ─── Color ───────────────────────────────────────────────────────────────────

/// Emit one SGR sequence setting the channels of `style` named by `which`.
///
/// Foreground parameters (`38;2;R;G;B`) always precede background
/// parameters (`48;2;R;G;B`). An empty `which` writes nothing.
pub fn sgr(w: &mut impl Write, style: Style, which: StyleDiff) -> io::Result<()> {
    if which.is_empty() {
        return Ok(());
    }

    w.write_all(b"\x1b[")?;
    if which.contains(StyleDiff::FOREGROUND) {
        let c = style.fore;
        write!(w, "38;2;{};{};{}", c.r, c.g, c.b)?;
    }
    if which.contains(StyleDiff::BACKGROUND) {
        if which.contains(StyleDiff::FOREGROUND) {
            w.write_all(b";")?;
        }
        let c = style.back;
        write!(w, "48;2;{};{};{}", c.r, c.g, c.b)?;
    }
    w.write_all(b"m")
}

// ─── Tests ───────────────────────────────────────────────────────────────────
