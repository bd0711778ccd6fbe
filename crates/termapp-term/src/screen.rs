// SPDX-License-Identifier: MIT
//
// Screen — one frame's worth of desired terminal contents.
//
// The render callback builds a fresh Screen every frame and hands it to the
// diff renderer, which only ever reads it. The renderer also keeps one
// long-lived Screen of its own: its record of what the terminal shows.
//
// Layout is a flat `Vec<Cell>` with row-major indexing (`index = y * width
// + x`), so the renderer's left-to-right, top-to-bottom scan is a linear
// walk over memory.
//
// Bounds: coordinates are the caller's responsibility. Addressing a cell
// outside the grid is a programming error and panics. Text that runs past
// the end of a row is caught by a debug assertion; in release builds it
// spills into the next row (or panics at the last one). Nothing here
// returns a `Result`.

use crate::cell::{Cell, Style};
use crate::color::Color;

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Where the hardware cursor should sit after the frame is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// Reserved for cursor coloring; the renderer does not emit it yet.
    pub style: Style,
    /// Column, 0-indexed.
    pub x: u16,
    /// Row, 0-indexed.
    pub y: u16,
    /// Whether the cursor is shown.
    pub visible: bool,
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// A full grid of cells plus a cursor.
///
/// # Examples
///
/// ```
/// use termapp_term::color::Color;
/// use termapp_term::screen::Screen;
///
/// let mut screen = Screen::new(10, 3);
/// screen.write(0, 0, Color::BLACK, Color::WHITE, "OK");
/// assert_eq!(screen.cell(1, 0).glyph, Some('K'));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
    cursor: Cursor,
}

impl Screen {
    /// Allocate a blank screen: empty cells, cursor hidden at the origin.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::EMPTY; usize::from(width) * usize::from(height)],
            cursor: Cursor::default(),
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    /// Width in columns.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Height in rows.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// All cells, row-major.
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// The cell at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the grid.
    #[inline]
    #[must_use]
    pub fn cell(&self, x: u16, y: u16) -> Cell {
        self.cells[self.locate(x, y)]
    }

    /// The declared cursor.
    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    // ─── Geometry ────────────────────────────────────────────────────────

    /// Flat index of `(x, y)`, panicking when it lies outside the grid.
    fn locate(&self, x: u16, y: u16) -> usize {
        assert!(
            x < self.width && y < self.height,
            "index out of bounds: ({x}, {y}) on a {}x{} screen",
            self.width,
            self.height
        );
        self.index_of(x, y)
    }

    /// Convert `(x, y)` to a flat index.
    #[inline]
    #[must_use]
    pub const fn index_of(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Convert a flat index back to `(x, y)`.
    ///
    /// Exact inverse of [`index_of`](Self::index_of) for every index below
    /// `width * height`.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // x < width and y < height, both u16.
    pub const fn position_of(&self, index: usize) -> (u16, u16) {
        let w = self.width as usize;
        ((index % w) as u16, (index / w) as u16)
    }

    // ─── Writing ─────────────────────────────────────────────────────────

    /// Write `text` into consecutive cells of row `y`, starting at column `x`.
    ///
    /// Each character takes one cell with style `(fore, back)`. There is no
    /// wrapping: the caller must keep the text inside the row.
    pub fn write(&mut self, x: u16, y: u16, back: Color, fore: Color, text: &str) {
        let style = Style::new(fore, back);
        let start = self.locate(x, y);
        for (cell, ch) in self.cells[start..].iter_mut().zip(text.chars()) {
            *cell = Cell::new(ch, style);
        }
        debug_assert!(
            text.chars().count() <= usize::from(self.width.saturating_sub(x)),
            "text overruns row {y}"
        );
    }

    /// Write a single character at `(x, y)`.
    pub fn write_glyph(&mut self, x: u16, y: u16, back: Color, fore: Color, ch: char) {
        let idx = self.locate(x, y);
        self.cells[idx] = Cell::new(ch, Style::new(fore, back));
    }

    /// Record where the cursor should be, and whether it is shown, once
    /// this frame is drawn.
    pub const fn set_cursor(&mut self, x: u16, y: u16, visible: bool) {
        self.cursor.x = x;
        self.cursor.y = y;
        self.cursor.visible = visible;
    }

    /// Replace the cell at a flat index. Used by the renderer to keep its
    /// displayed-screen record in sync.
    #[inline]
    pub(crate) fn set_index(&mut self, index: usize, cell: Cell) {
        self.cells[index] = cell;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
