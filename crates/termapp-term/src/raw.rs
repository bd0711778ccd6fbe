// SPDX-License-Identifier: MIT
//
// Raw-mode controller.
//
// Owns the one piece of global terminal state we change: the input mode.
// The lifecycle is a straight line, never a loop:
//
//   Cooked ──enter──▶ Raw ──restore──▶ Closed
//
// `enter` captures the current mode before replacing it, and `restore`
// re-applies exactly what was captured. Restore runs at most once: after
// the first attempt, successful or not, the controller is Closed and any
// further call is a no-op. Nothing else in the crate calls `set_mode`.

use tracing::debug;

use crate::device::TerminalDevice;
use crate::error::{Error, Result};

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeState {
    /// The terminal is in whatever mode we found it in.
    Cooked,
    /// Raw mode is active and the original mode is captured.
    Raw,
    /// The original mode was put back (or the attempt failed). Terminal.
    Closed,
}

/// Captures a device's input mode and switches it to raw.
pub struct RawMode<D: TerminalDevice> {
    original: Option<D::Mode>,
    state: ModeState,
}

impl<D: TerminalDevice> RawMode<D> {
    /// A controller that has not touched the terminal yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            original: None,
            state: ModeState::Cooked,
        }
    }

    /// The current lifecycle state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> ModeState {
        self.state
    }

    /// Capture the current mode and switch `device` to raw mode.
    ///
    /// A no-op unless the controller is [`Cooked`](ModeState::Cooked).
    ///
    /// # Errors
    ///
    /// [`Error::ModeQuery`] if the current mode can't be read,
    /// [`Error::ModeSet`] if raw mode can't be applied. Either way the
    /// controller stays Cooked.
    pub fn enter(&mut self, device: &mut D) -> Result<()> {
        if self.state != ModeState::Cooked {
            return Ok(());
        }

        let original = device.get_mode().map_err(Error::ModeQuery)?;
        let raw = D::raw_mode(&original);
        device.set_mode(&raw).map_err(Error::ModeSet)?;

        self.original = Some(original);
        self.state = ModeState::Raw;
        debug!("terminal switched to raw mode");
        Ok(())
    }

    /// Put back the mode captured by [`enter`](Self::enter).
    ///
    /// A no-op unless the controller is [`Raw`](ModeState::Raw).
    ///
    /// # Errors
    ///
    /// [`Error::ModeRestore`] if the device rejects the original mode. The
    /// controller is Closed regardless; there is no second attempt.
    pub fn restore(&mut self, device: &mut D) -> Result<()> {
        if self.state != ModeState::Raw {
            return Ok(());
        }
        self.state = ModeState::Closed;

        let Some(original) = self.original.take() else {
            return Ok(());
        };
        device.set_mode(&original).map_err(Error::ModeRestore)?;
        debug!("terminal mode restored");
        Ok(())
    }
}

impl<D: TerminalDevice> Default for RawMode<D> {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
