// SPDX-License-Identifier: MIT
//
// Terminal session.
//
// Ties the pieces into one owner: the device, the raw-mode controller, the
// diff renderer with its model of what is on screen, the pending output
// buffer, and the key reader thread.
//
//   open:   size → raw mode → clear/home → flush → spawn key reader
//   frame:  render(width, height) → diff → one write
//   close:  stop reader → reset colors, show cursor → restore mode
//
// Startup is all-or-nothing. If anything after entering raw mode fails, the
// original mode is put back before the error is returned, so a failed `open`
// never leaves the user's shell raw. A session that is dropped without
// `close` (early return, panic unwinding) restores the mode in `Drop`.

use std::time::Duration;

use crossbeam_channel::Receiver;
use tracing::{debug, trace, warn};

use crate::ansi;
use crate::device::{Size, TerminalDevice};
use crate::diff::{DiffRenderer, RenderStats};
use crate::error::{Error, Result};
use crate::input::Key;
use crate::output::OutputBuffer;
use crate::raw::{ModeState, RawMode};
use crate::reader::KeyReader;
use crate::screen::Screen;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Session tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Capacity of the key channel. When it is full the reader thread waits
    /// for the frame loop to catch up; keys are never dropped.
    pub key_capacity: usize,

    /// How long the reader waits for a byte before checking whether it
    /// should stop. Bounds the latency of `close`.
    pub poll_interval: Duration,

    /// Size to assume when the device can't report one. `None` makes a
    /// failed size query abort [`Terminal::open`].
    pub fallback_size: Option<Size>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            key_capacity: 64,
            poll_interval: Duration::from_millis(50),
            fallback_size: None,
        }
    }
}

// ─── Terminal ────────────────────────────────────────────────────────────────

/// A running full-screen session on a [`TerminalDevice`].
///
/// # Example
///
/// ```no_run
/// use termapp_term::color::Color;
/// use termapp_term::device::TtyDevice;
/// use termapp_term::screen::Screen;
/// use termapp_term::terminal::{SessionConfig, Terminal};
///
/// let mut term = Terminal::open(TtyDevice::open()?, SessionConfig::default())?;
/// term.redraw(|w, h| {
///     let mut screen = Screen::new(w, h);
///     screen.write(0, 0, Color::BLACK, Color::WHITE, "hello");
///     screen
/// })?;
/// let _key = term.keys().recv();
/// term.close()?;
/// # Ok::<(), termapp_term::Error>(())
/// ```
pub struct Terminal<D: TerminalDevice> {
    device: D,
    raw: RawMode<D>,
    renderer: DiffRenderer,
    out: OutputBuffer,
    reader: KeyReader,
    keys: Receiver<Key>,
    errors: Receiver<Error>,
    size: Size,
}

impl<D: TerminalDevice> Terminal<D> {
    /// Start a session: measure the terminal, switch it to raw mode, clear
    /// it, and start reading keys.
    ///
    /// # Errors
    ///
    /// - [`Error::Geometry`] if the size is unknown and no fallback is set.
    /// - [`Error::ModeQuery`] / [`Error::ModeSet`] if raw mode can't be
    ///   entered.
    /// - [`Error::Io`] if the clear sequence can't be written or the reader
    ///   thread can't start. Raw mode has been undone by then.
    pub fn open(mut device: D, config: SessionConfig) -> Result<Self> {
        let size = match device.size() {
            Ok(size) => size,
            Err(e) => match config.fallback_size {
                Some(size) => {
                    warn!(error = %e, cols = size.cols, rows = size.rows, "size query failed, using fallback");
                    size
                }
                None => return Err(Error::Geometry(e)),
            },
        };

        let mut raw = RawMode::new();
        raw.enter(&mut device)?;

        let mut out = OutputBuffer::new();
        let started = Self::start(&mut device, &mut out, &config);
        let (reader, keys, errors) = match started {
            Ok(parts) => parts,
            Err(e) => {
                if let Err(restore) = raw.restore(&mut device) {
                    warn!(error = %restore, "could not restore terminal mode after failed startup");
                }
                return Err(e);
            }
        };

        debug!(cols = size.cols, rows = size.rows, "terminal session opened");
        Ok(Self {
            device,
            raw,
            renderer: DiffRenderer::new(size.cols, size.rows),
            out,
            reader,
            keys,
            errors,
            size,
        })
    }

    /// The post-raw-mode half of `open`: clear the screen, start the reader.
    fn start(
        device: &mut D,
        out: &mut OutputBuffer,
        config: &SessionConfig,
    ) -> Result<(KeyReader, Receiver<Key>, Receiver<Error>)> {
        ansi::clear(out)?;
        out.flush_to(device)?;

        let input = device.input()?;
        let parts = KeyReader::spawn(input, config.key_capacity, config.poll_interval)?;
        Ok(parts)
    }

    /// Terminal size, as measured at startup.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Build a frame with `render(width, height)` and show it.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the frame's bytes can't be written. The renderer
    /// already counts the frame as displayed; unsent bytes from a short
    /// write go out with the next frame.
    pub fn redraw<F>(&mut self, render: F) -> Result<RenderStats>
    where
        F: FnOnce(u16, u16) -> Screen,
    {
        let screen = render(self.size.cols, self.size.rows);
        self.present(&screen)
    }

    /// Show an already built screen. Same as [`redraw`](Self::redraw)
    /// without the callback.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the frame's bytes can't be written.
    pub fn present(&mut self, screen: &Screen) -> Result<RenderStats> {
        let stats = self.renderer.render(screen, &mut self.out);
        self.out.flush_to(&mut self.device)?;
        trace!(
            glyphs = stats.glyphs,
            moves = stats.cursor_moves,
            styles = stats.style_changes,
            bytes = stats.bytes,
            pending = self.out.len(),
            "frame presented"
        );
        Ok(stats)
    }

    /// Bytes produced but not yet accepted by the device.
    #[inline]
    #[must_use]
    pub fn pending_output(&self) -> usize {
        self.out.len()
    }

    /// Decoded keys, in typing order.
    #[inline]
    #[must_use]
    pub const fn keys(&self) -> &Receiver<Key> {
        &self.keys
    }

    /// Key reader failures. At most one error ever arrives; after it the
    /// key channel is closed.
    #[inline]
    #[must_use]
    pub const fn errors(&self) -> &Receiver<Error> {
        &self.errors
    }

    /// End the session and give the terminal back in its original mode.
    ///
    /// # Errors
    ///
    /// [`Error::ModeRestore`] if the original mode can't be re-applied.
    /// The reset and show-cursor bytes are best-effort and never fail this.
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    /// Idempotent teardown shared by `close` and `Drop`.
    fn shutdown(&mut self) -> Result<()> {
        self.reader.stop();
        if self.raw.state() != ModeState::Raw {
            return Ok(());
        }

        let _ = ansi::reset(&mut self.out).and_then(|()| ansi::cursor_show(&mut self.out));
        if let Err(e) = self.out.flush_to(&mut self.device) {
            debug!(error = %e, "final reset not written");
        }

        self.raw.restore(&mut self.device)?;
        debug!("terminal session closed");
        Ok(())
    }
}

impl<D: TerminalDevice> Drop for Terminal<D> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(error = %e, "terminal mode not restored on drop");
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
