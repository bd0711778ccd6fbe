// SPDX-License-Identifier: MIT
//
// Color — 24-bit RGB, the only color model this engine speaks.
//
// Every color reaches the terminal as a true-color SGR parameter
// (`38;2;R;G;B` / `48;2;R;G;B`). There is no palette, no nearest-match,
// and no alpha: two colors are the same color only when all three
// channels are equal, which is exactly what the diff renderer needs.

/// A 24-bit true-color value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Pure black, `#000000`. Also the default channel value.
    pub const BLACK: Self = Self::rgb(0x00, 0x00, 0x00);

    /// Pure white, `#ffffff`.
    pub const WHITE: Self = Self::rgb(0xff, 0xff, 0xff);

    /// Create a color from its three channels.
    #[inline]
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create a color from a packed `0xRRGGBB` integer.
    ///
    /// Bits above the low 24 are ignored.
    ///
    /// ```
    /// use termapp_term::color::Color;
    ///
    /// assert_eq!(Color::from_hex(0xff8000), Color::rgb(255, 128, 0));
    /// ```
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Truncation is the point: one byte per channel.
    pub const fn from_hex(packed: u32) -> Self {
        Self {
            r: (packed >> 16) as u8,
            g: (packed >> 8) as u8,
            b: packed as u8,
        }
    }

    /// The color packed back into `0xRRGGBB`.
    #[inline]
    #[must_use]
    pub const fn to_hex(self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
