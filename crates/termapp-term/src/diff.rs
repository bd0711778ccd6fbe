// SPDX-License-Identifier: MIT
//
// Differential renderer — the core of frame rendering performance.
//
// Instead of redrawing the entire screen every frame, we compare the new
// Screen against our record of what the terminal currently shows and emit
// escape sequences only for cells that actually changed. Unchanged cells
// cost zero bytes.
//
// The pipeline per frame:
//
//   1. The render callback builds a Screen (the "next" frame).
//   2. DiffRenderer::render() walks both grids index-for-index.
//   3. For each changed cell: position the cursor (skipped when the terminal
//      already auto-advanced there), set colors (skipped when unchanged),
//      write the glyph, and copy the cell into the displayed record.
//   4. Park the cursor at the frame's declared position and fix visibility.
//   5. Everything lands in an OutputBuffer; the session flushes it once.
//
// Tracking: the renderer mirrors the terminal's cursor position, last SGR
// colors and cursor visibility, and never sends a sequence that would not
// change one of them. A position or style of `None`
// means "unknown", and the next use re-sends it in full.
//
// This is a single linear pass. Minimality is per cell (unchanged cells are
// free), not a globally optimal edit script over escape-sequence bytes.

use unicode_width::UnicodeWidthChar;

use crate::ansi;
use crate::cell::{Style, StyleDiff};
use crate::output::OutputBuffer;
use crate::screen::Screen;

// ─── RenderStats ─────────────────────────────────────────────────────────────

/// Statistics from a render pass, for profiling, logging, and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    /// Glyphs written (one per changed cell).
    pub glyphs: usize,
    /// Cells that matched the displayed screen and were skipped.
    pub cells_skipped: usize,
    /// Cursor-movement sequences emitted, relative or absolute.
    pub cursor_moves: usize,
    /// SGR color sequences emitted.
    pub style_changes: usize,
    /// Show/hide cursor sequences emitted.
    pub visibility_changes: usize,
    /// Total bytes appended to the output buffer.
    pub bytes: usize,
}

impl RenderStats {
    /// Total cells examined (written + skipped).
    #[inline]
    #[must_use]
    pub const fn total_cells(&self) -> usize {
        self.glyphs + self.cells_skipped
    }
}

// ─── DiffRenderer ────────────────────────────────────────────────────────────

/// Differential renderer holding the terminal's displayed state.
///
/// A new renderer assumes the terminal has just received
/// [`ansi::CLEAR`]: blank screen, cursor hidden at the origin, colors at
/// terminal defaults (which match no RGB value, so the first SGR sends both
/// channels).
///
/// # Usage
///
/// ```
/// use termapp_term::color::Color;
/// use termapp_term::diff::DiffRenderer;
/// use termapp_term::output::OutputBuffer;
/// use termapp_term::screen::Screen;
///
/// let mut renderer = DiffRenderer::new(10, 3);
/// let mut out = OutputBuffer::new();
///
/// let mut frame = Screen::new(10, 3);
/// frame.write(0, 0, Color::BLACK, Color::WHITE, "OK");
///
/// let stats = renderer.render(&frame, &mut out);
/// assert_eq!(stats.glyphs, 2);
/// assert_eq!(renderer.displayed(), &frame);
/// ```
pub struct DiffRenderer {
    displayed: Screen,
    at: Option<(u16, u16)>,
    style: Option<Style>,
    visible: bool,
}

impl DiffRenderer {
    /// Create a renderer for a freshly cleared `width × height` terminal.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            displayed: Screen::new(width, height),
            at: Some((0, 0)),
            style: None,
            visible: false,
        }
    }

    /// What the renderer believes the terminal shows.
    #[inline]
    #[must_use]
    pub const fn displayed(&self) -> &Screen {
        &self.displayed
    }

    /// The tracked terminal cursor position, if known.
    #[inline]
    #[must_use]
    pub const fn tracked_position(&self) -> Option<(u16, u16)> {
        self.at
    }

    /// Forget the tracked cursor position and colors.
    ///
    /// Call after writing anything to the terminal behind the renderer's
    /// back (an SGR reset, a manual cursor move). Cell contents stay as
    /// they are.
    pub const fn invalidate(&mut self) {
        self.at = None;
        self.style = None;
    }

    /// Append the escape sequences that turn the displayed screen into
    /// `next`, and adopt `next` as the displayed screen.
    ///
    /// `next` must have the renderer's dimensions; a mismatched screen is a
    /// caller bug (only the overlapping prefix of cells is compared).
    pub fn render(&mut self, next: &Screen, out: &mut OutputBuffer) -> RenderStats {
        debug_assert_eq!(
            (next.width(), next.height()),
            (self.displayed.width(), self.displayed.height()),
            "screen dimensions must match the terminal"
        );

        let start = out.len();
        let mut stats = RenderStats::default();
        let count = next.cells().len().min(self.displayed.cells().len());

        // ── Diff loop ──
        for index in 0..count {
            let want = next.cells()[index];
            if self.displayed.cells()[index] == want {
                stats.cells_skipped += 1;
                continue;
            }

            let (x, y) = next.position_of(index);
            self.move_to(out, x, y, &mut stats);
            self.apply_style(out, want.style, &mut stats);

            let ch = want.display_char();
            out.push_char(ch);
            stats.glyphs += 1;

            // The terminal advances one column per narrow glyph. For wide,
            // zero-width, or control characters we can't be sure where it
            // went, so the next write positions absolutely.
            self.at = match ch.width() {
                Some(1) => x.checked_add(1).map(|nx| (nx, y)),
                _ => None,
            };

            self.displayed.set_index(index, want);
        }

        // ── Cursor ──
        let cursor = next.cursor();
        self.move_to(out, cursor.x, cursor.y, &mut stats);

        if cursor.visible != self.visible {
            if cursor.visible {
                ansi::cursor_show(out).ok();
            } else {
                ansi::cursor_hide(out).ok();
            }
            self.visible = cursor.visible;
            stats.visibility_changes += 1;
        }

        stats.bytes = out.len() - start;
        stats
    }

    /// Position the terminal cursor at `(x, y)` unless it is already there.
    ///
    /// Same-row moves to the right use the short relative form; everything
    /// else uses an absolute CUP.
    fn move_to(&mut self, out: &mut OutputBuffer, x: u16, y: u16, stats: &mut RenderStats) {
        match self.at {
            Some(at) if at == (x, y) => return,
            Some((ax, ay)) if ay == y && x > ax => ansi::cursor_right(out, x - ax).ok(),
            _ => ansi::cursor_to(out, x, y).ok(),
        };
        self.at = Some((x, y));
        stats.cursor_moves += 1;
    }

    /// Send the channels of `style` that differ from the last-sent style.
    fn apply_style(&mut self, out: &mut OutputBuffer, style: Style, stats: &mut RenderStats) {
        let which = self.style.map_or(StyleDiff::all(), |last| last.diff(style));
        if which.is_empty() {
            return;
        }
        ansi::sgr(out, style, which).ok();
        self.style = Some(style);
        stats.style_changes += 1;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use crate::color::Color;
    use pretty_assertions::assert_eq;

    /// Helper: render a frame and return (stats, output_string).
    fn render_frame(renderer: &mut DiffRenderer, frame: &Screen) -> (RenderStats, String) {
        let mut out = OutputBuffer::new();
        let stats = renderer.render(frame, &mut out);
        (stats, String::from_utf8(out.as_bytes().to_vec()).unwrap())
    }

    fn white_on_black() -> &'static str {
        "\x1b[38;2;255;255;255;48;2;0;0;0m"
    }

    /// Tiny deterministic LCG so the property tests need no extra crates.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u32 {
            self.0 = self.0.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            #[allow(clippy::cast_possible_truncation)]
            let v = (self.0 >> 33) as u32;
            v
        }
    }

    fn random_screen(rng: &mut Lcg, width: u16, height: u16) -> Screen {
        let palette = [Color::BLACK, Color::WHITE, Color::rgb(200, 30, 30)];
        let glyphs = ['a', 'b', ' ', 'é'];
        let mut screen = Screen::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if rng.next() % 3 == 0 {
                    let back = palette[rng.next() as usize % palette.len()];
                    let fore = palette[rng.next() as usize % palette.len()];
                    let ch = glyphs[rng.next() as usize % glyphs.len()];
                    screen.write_glyph(x, y, back, fore, ch);
                }
            }
        }
        screen
    }

    // ── Scenario ────────────────────────────────────────────────────────

    #[test]
    fn ok_on_blank_screen() {
        let mut renderer = DiffRenderer::new(10, 3);
        let mut frame = Screen::new(10, 3);
        frame.write(0, 0, Color::BLACK, Color::WHITE, "OK");

        let (stats, output) = render_frame(&mut renderer, &frame);

        assert_eq!(stats.glyphs, 2);
        assert_eq!(stats.cursor_moves, 1);
        assert_eq!(stats.style_changes, 1);
        assert_eq!(stats.visibility_changes, 0);
        assert_eq!(stats.cells_skipped, 28);
        assert_eq!(output, format!("{}OK\x1b[1;1H", white_on_black()));
        assert_eq!(stats.bytes, output.len());
    }

    // ── Identical Frames ────────────────────────────────────────────────

    #[test]
    fn same_frame_twice_emits_nothing() {
        let mut renderer = DiffRenderer::new(10, 3);
        let mut frame = Screen::new(10, 3);
        frame.write(3, 1, Color::BLACK, Color::WHITE, "hello");
        frame.set_cursor(2, 2, true);

        render_frame(&mut renderer, &frame);
        let (stats, output) = render_frame(&mut renderer, &frame);

        assert_eq!(output, "");
        assert_eq!(stats.glyphs, 0);
        assert_eq!(stats.cells_skipped, 30);
    }

    #[test]
    fn blank_on_blank_only_parks_cursor() {
        let mut renderer = DiffRenderer::new(4, 2);
        let mut frame = Screen::new(4, 2);
        frame.set_cursor(1, 1, false);

        let (stats, output) = render_frame(&mut renderer, &frame);

        assert_eq!(stats.glyphs, 0);
        assert_eq!(output, "\x1b[2;2H");
    }

    // ── Diff Minimality ─────────────────────────────────────────────────

    #[test]
    fn glyph_count_equals_changed_cells() {
        let mut rng = Lcg(7);
        for _ in 0..20 {
            let a = random_screen(&mut rng, 13, 6);
            let b = random_screen(&mut rng, 13, 6);
            let expected = a
                .cells()
                .iter()
                .zip(b.cells())
                .filter(|(l, r)| l != r)
                .count();

            let mut renderer = DiffRenderer::new(13, 6);
            render_frame(&mut renderer, &a);
            let (stats, _) = render_frame(&mut renderer, &b);
            assert_eq!(stats.glyphs, expected);

            let (again, _) = render_frame(&mut renderer, &b);
            assert_eq!(again.glyphs, 0);
        }
    }

    #[test]
    fn displayed_matches_next_after_render() {
        let mut rng = Lcg(99);
        let mut renderer = DiffRenderer::new(9, 4);
        for _ in 0..10 {
            let frame = random_screen(&mut rng, 9, 4);
            render_frame(&mut renderer, &frame);
            assert_eq!(renderer.displayed().cells(), frame.cells());
        }
    }

    #[test]
    fn explicit_space_over_unset_is_a_change() {
        let mut renderer = DiffRenderer::new(3, 1);
        let mut frame = Screen::new(3, 1);
        frame.write_glyph(1, 0, Color::BLACK, Color::BLACK, ' ');

        let (stats, output) = render_frame(&mut renderer, &frame);

        assert_eq!(stats.glyphs, 1);
        assert_eq!(output, "\x1b[C\x1b[38;2;0;0;0;48;2;0;0;0m \x1b[1;1H");
    }

    #[test]
    fn unset_glyph_renders_as_space() {
        let mut renderer = DiffRenderer::new(2, 1);
        let mut frame = Screen::new(2, 1);
        frame.write_glyph(0, 0, Color::BLACK, Color::WHITE, 'x');
        render_frame(&mut renderer, &frame);

        // Back to blank: the cell reverts to an unset glyph in black on black.
        let (stats, output) = render_frame(&mut renderer, &Screen::new(2, 1));

        assert_eq!(stats.glyphs, 1);
        assert_eq!(output, "\x1b[38;2;0;0;0m \x1b[1;1H");
        assert_eq!(renderer.displayed().cell(0, 0), Cell::EMPTY);
    }

    // ── Style Minimality ────────────────────────────────────────────────

    #[test]
    fn same_style_run_emits_one_sgr() {
        let mut renderer = DiffRenderer::new(10, 1);
        let mut frame = Screen::new(10, 1);
        frame.write(0, 0, Color::BLACK, Color::WHITE, "abcdef");

        let (stats, _) = render_frame(&mut renderer, &frame);

        assert_eq!(stats.style_changes, 1);
        assert_eq!(stats.glyphs, 6);
    }

    #[test]
    fn glyph_only_change_emits_no_sgr() {
        let mut renderer = DiffRenderer::new(5, 1);
        let mut frame = Screen::new(5, 1);
        frame.write(0, 0, Color::BLACK, Color::WHITE, "ab");
        render_frame(&mut renderer, &frame);

        frame.write(0, 0, Color::BLACK, Color::WHITE, "xy");
        let (stats, output) = render_frame(&mut renderer, &frame);

        assert_eq!(stats.style_changes, 0);
        assert_eq!(output, "xy\x1b[1;1H");
    }

    #[test]
    fn background_only_change() {
        let mut renderer = DiffRenderer::new(5, 1);
        let red = Color::rgb(255, 0, 0);
        let mut frame = Screen::new(5, 1);
        frame.write(0, 0, Color::BLACK, Color::WHITE, "a");
        frame.write(1, 0, red, Color::WHITE, "b");

        let (_, output) = render_frame(&mut renderer, &frame);

        assert_eq!(
            output,
            format!("{}a\x1b[48;2;255;0;0mb\x1b[1;1H", white_on_black())
        );
    }

    #[test]
    fn foreground_only_change() {
        let mut renderer = DiffRenderer::new(5, 1);
        let mut frame = Screen::new(5, 1);
        frame.write(0, 0, Color::BLACK, Color::WHITE, "a");
        frame.write(1, 0, Color::BLACK, Color::rgb(0, 255, 0), "b");

        let (_, output) = render_frame(&mut renderer, &frame);

        assert_eq!(
            output,
            format!("{}a\x1b[38;2;0;255;0mb\x1b[1;1H", white_on_black())
        );
    }

    #[test]
    fn style_persists_across_frames() {
        let mut renderer = DiffRenderer::new(5, 1);
        let mut frame = Screen::new(5, 1);
        frame.write(0, 0, Color::BLACK, Color::WHITE, "a");
        render_frame(&mut renderer, &frame);

        frame.write(3, 0, Color::BLACK, Color::WHITE, "z");
        let (stats, _) = render_frame(&mut renderer, &frame);
        assert_eq!(stats.style_changes, 0);
    }

    // ── Cursor Movement ─────────────────────────────────────────────────

    #[test]
    fn relative_move_on_same_row() {
        let mut renderer = DiffRenderer::new(10, 5);
        let mut park = Screen::new(10, 5);
        park.set_cursor(5, 2, false);
        render_frame(&mut renderer, &park);
        assert_eq!(renderer.tracked_position(), Some((5, 2)));

        let mut frame = park.clone();
        frame.write_glyph(7, 2, Color::BLACK, Color::WHITE, 'x');
        let (_, output) = render_frame(&mut renderer, &frame);

        assert!(output.starts_with("\x1b[2C"), "got {output:?}");
        assert!(!output.starts_with("\x1b[3;8H"));
    }

    #[test]
    fn absolute_move_to_other_row() {
        let mut renderer = DiffRenderer::new(10, 5);
        let mut park = Screen::new(10, 5);
        park.set_cursor(5, 2, false);
        render_frame(&mut renderer, &park);

        let mut frame = park.clone();
        frame.write_glyph(3, 4, Color::BLACK, Color::WHITE, 'x');
        let (_, output) = render_frame(&mut renderer, &frame);

        assert!(output.starts_with("\x1b[5;4H"), "got {output:?}");
    }

    #[test]
    fn absolute_move_leftward_on_same_row() {
        let mut renderer = DiffRenderer::new(10, 5);
        let mut park = Screen::new(10, 5);
        park.set_cursor(5, 2, false);
        render_frame(&mut renderer, &park);

        let mut frame = park.clone();
        frame.write_glyph(1, 2, Color::BLACK, Color::WHITE, 'x');
        let (_, output) = render_frame(&mut renderer, &frame);

        assert!(output.starts_with("\x1b[3;2H"), "got {output:?}");
    }

    #[test]
    fn adjacent_cells_need_no_move() {
        let mut renderer = DiffRenderer::new(10, 2);
        let mut frame = Screen::new(10, 2);
        frame.write(4, 1, Color::BLACK, Color::WHITE, "abc");

        let (stats, output) = render_frame(&mut renderer, &frame);

        // One move to (4, 1), then one back to the declared cursor.
        assert_eq!(stats.cursor_moves, 2);
        assert_eq!(
            output,
            format!("\x1b[2;5H{}abc\x1b[1;1H", white_on_black())
        );
    }

    #[test]
    fn gap_on_row_uses_relative_move() {
        let mut renderer = DiffRenderer::new(10, 1);
        let mut frame = Screen::new(10, 1);
        frame.write(0, 0, Color::BLACK, Color::WHITE, "a");
        frame.write(4, 0, Color::BLACK, Color::WHITE, "b");

        let (_, output) = render_frame(&mut renderer, &frame);

        assert_eq!(output, format!("{}a\x1b[3Cb\x1b[1;1H", white_on_black()));
    }

    #[test]
    fn row_end_forces_absolute_move() {
        let mut renderer = DiffRenderer::new(3, 2);
        let mut frame = Screen::new(3, 2);
        frame.write(0, 0, Color::BLACK, Color::WHITE, "abc");
        frame.write(0, 1, Color::BLACK, Color::WHITE, "d");

        let (_, output) = render_frame(&mut renderer, &frame);

        assert_eq!(
            output,
            format!("{}abc\x1b[2;1Hd\x1b[1;1H", white_on_black())
        );
    }

    #[test]
    fn cursor_parked_at_declared_position() {
        let mut renderer = DiffRenderer::new(10, 3);
        let mut frame = Screen::new(10, 3);
        frame.write(0, 0, Color::BLACK, Color::WHITE, "hi");
        frame.set_cursor(2, 0, false);

        let (stats, output) = render_frame(&mut renderer, &frame);

        // The terminal already sits at (2, 0) after "hi".
        assert_eq!(stats.cursor_moves, 0);
        assert!(output.ends_with("hi"));
        assert_eq!(renderer.tracked_position(), Some((2, 0)));
    }

    #[test]
    fn wide_glyph_forces_absolute_move() {
        let mut renderer = DiffRenderer::new(4, 1);
        let mut frame = Screen::new(4, 1);
        frame.write(0, 0, Color::BLACK, Color::WHITE, "中x");

        let (stats, output) = render_frame(&mut renderer, &frame);

        assert_eq!(stats.glyphs, 2);
        assert_eq!(
            output,
            format!("{}中\x1b[1;2Hx\x1b[1;1H", white_on_black())
        );
    }

    #[test]
    fn invalidate_resends_position_and_style() {
        let mut renderer = DiffRenderer::new(4, 1);
        let mut frame = Screen::new(4, 1);
        frame.write(0, 0, Color::BLACK, Color::WHITE, "a");
        render_frame(&mut renderer, &frame);

        renderer.invalidate();
        frame.write(1, 0, Color::BLACK, Color::WHITE, "b");
        let (_, output) = render_frame(&mut renderer, &frame);

        assert_eq!(
            output,
            format!("\x1b[1;2H{}b\x1b[1;1H", white_on_black())
        );
    }

    // ── Visibility ──────────────────────────────────────────────────────

    #[test]
    fn show_cursor_once() {
        let mut renderer = DiffRenderer::new(4, 1);
        let mut frame = Screen::new(4, 1);
        frame.set_cursor(0, 0, true);

        let (first, output) = render_frame(&mut renderer, &frame);
        assert_eq!(first.visibility_changes, 1);
        assert_eq!(output, "\x1b[?25h");

        let (second, output) = render_frame(&mut renderer, &frame);
        assert_eq!(second.visibility_changes, 0);
        assert_eq!(output, "");
    }

    #[test]
    fn hide_cursor_after_show() {
        let mut renderer = DiffRenderer::new(4, 1);
        let mut frame = Screen::new(4, 1);
        frame.set_cursor(0, 0, true);
        render_frame(&mut renderer, &frame);

        frame.set_cursor(0, 0, false);
        let (_, output) = render_frame(&mut renderer, &frame);
        assert_eq!(output, "\x1b[?25l");
    }

    #[test]
    fn visibility_follows_cells_and_move() {
        let mut renderer = DiffRenderer::new(4, 2);
        let mut frame = Screen::new(4, 2);
        frame.write_glyph(0, 0, Color::BLACK, Color::WHITE, 'q');
        frame.set_cursor(1, 1, true);

        let (_, output) = render_frame(&mut renderer, &frame);
        assert_eq!(
            output,
            format!("{}q\x1b[2;2H\x1b[?25h", white_on_black())
        );
    }

    // ── Stats ───────────────────────────────────────────────────────────

    #[test]
    fn total_cells_covers_grid() {
        let mut renderer = DiffRenderer::new(8, 3);
        let mut frame = Screen::new(8, 3);
        frame.write(0, 2, Color::BLACK, Color::WHITE, "xyz");
        let (stats, _) = render_frame(&mut renderer, &frame);
        assert_eq!(stats.total_cells(), 24);
    }

    #[test]
    fn zero_size_renders_nothing() {
        let mut renderer = DiffRenderer::new(0, 0);
        let mut frame = Screen::new(0, 0);
        frame.set_cursor(0, 0, false);
        let (stats, output) = render_frame(&mut renderer, &frame);
        assert_eq!(stats, RenderStats::default());
        assert_eq!(output, "");
    }
}
