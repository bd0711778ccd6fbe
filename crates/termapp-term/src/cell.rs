// SPDX-License-Identifier: MIT
//
// Cell — the atomic unit of terminal rendering.
//
// Every character position on screen is a Cell: a Style (foreground and
// background color) plus at most one glyph. The diff renderer compares
// cells with the derived `PartialEq`, so equality must be exact and
// component-wise, including the glyph. An unset glyph renders as a space
// but is still a different cell from an explicit `' '`.

use bitflags::bitflags;

use crate::color::Color;

// ─── Style ───────────────────────────────────────────────────────────────────

/// Foreground and background color of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    /// Text color.
    pub fore: Color,
    /// Fill color.
    pub back: Color,
}

bitflags! {
    /// Which channels of a [`Style`] differ from another style.
    ///
    /// The SGR emitter uses this to send only the changed half of a
    /// style; foreground parameters always come first.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct StyleDiff: u8 {
        /// Foreground color differs (`38;2;R;G;B`).
        const FOREGROUND = 1 << 0;
        /// Background color differs (`48;2;R;G;B`).
        const BACKGROUND = 1 << 1;
    }
}

impl Style {
    /// Create a style. Note the argument order: foreground first.
    #[inline]
    #[must_use]
    pub const fn new(fore: Color, back: Color) -> Self {
        Self { fore, back }
    }

    /// The channels that must change to turn `self` into `next`.
    #[inline]
    #[must_use]
    pub fn diff(self, next: Self) -> StyleDiff {
        let mut diff = StyleDiff::empty();
        if self.fore != next.fore {
            diff |= StyleDiff::FOREGROUND;
        }
        if self.back != next.back {
            diff |= StyleDiff::BACKGROUND;
        }
        diff
    }
}

// ─── Cell ────────────────────────────────────────────────────────────────────

/// A single terminal cell: style plus glyph.
///
/// `glyph: None` means no character was written; it renders as a space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Cell {
    /// Colors for this position.
    pub style: Style,
    /// The character, if one was written.
    pub glyph: Option<char>,
}

impl Cell {
    /// An empty cell: default style, no glyph.
    pub const EMPTY: Self = Self {
        style: Style::new(Color::BLACK, Color::BLACK),
        glyph: None,
    };

    /// Create a cell holding `ch` in `style`.
    #[inline]
    #[must_use]
    pub const fn new(ch: char, style: Style) -> Self {
        Self {
            style,
            glyph: Some(ch),
        }
    }

    /// The character actually sent to the terminal for this cell.
    #[inline]
    #[must_use]
    pub fn display_char(self) -> char {
        self.glyph.unwrap_or(' ')
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
